//! Country-wide university list (Hipolabs), filtered by name containment.
//!
//! The directory has no city field and a sparse `state-province`, so matching
//! is loose: the state must appear in the province or the name, and the city
//! must appear in the name. The full country list is fetched once per TTL.

use std::sync::Arc;

use enrol_types::{InstitutionQuery, SourceError};
use serde::Deserialize;

use moka::future::Cache;

use crate::cache::CachePolicy;
use crate::http::{HttpFetcher, endpoint, norm};
use crate::{Source, SourceFut};

#[derive(Debug, Clone, Deserialize)]
struct University {
    name: Option<String>,
    #[serde(rename = "state-province")]
    province: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UniversityDirectory {
    fetcher: HttpFetcher,
    url: String,
    country: String,
    list: Option<Cache<String, Arc<Vec<University>>>>,
}

impl UniversityDirectory {
    pub fn new(fetcher: HttpFetcher, url: impl Into<String>, country: impl Into<String>) -> Self {
        Self::with_cache(fetcher, url, country, Some(CachePolicy::default()))
    }

    /// `None` fetches the country list on every query.
    pub fn with_cache(
        fetcher: HttpFetcher,
        url: impl Into<String>,
        country: impl Into<String>,
        policy: Option<CachePolicy>,
    ) -> Self {
        Self {
            fetcher,
            url: url.into(),
            country: country.into(),
            list: policy.map(|p| p.build()),
        }
    }

    async fn universities(&self) -> Result<Arc<Vec<University>>, SourceError> {
        if let Some(cache) = &self.list
            && let Some(list) = cache.get(&self.country).await
        {
            return Ok(list);
        }

        let mut url = endpoint(&self.url, "")?;
        url.query_pairs_mut().append_pair("country", &self.country);
        let list: Vec<University> = self.fetcher.get_json(url).await?;
        let list = Arc::new(list);
        if let Some(cache) = &self.list
            && !list.is_empty()
        {
            cache.insert(self.country.clone(), list.clone()).await;
        }
        Ok(list)
    }

    async fn fetch(&self, query: &InstitutionQuery) -> Result<Vec<String>, SourceError> {
        let universities = self.universities().await?;
        let state = norm(&query.state);
        let city = norm(&query.city);

        let names: Vec<String> = universities
            .iter()
            .filter_map(|u| {
                let name = u.name.as_deref()?.trim();
                if name.is_empty() {
                    return None;
                }
                let name_n = norm(name);
                let province_n = norm(u.province.as_deref().unwrap_or_default());
                let ok_state =
                    state.is_empty() || province_n.contains(&state) || name_n.contains(&state);
                let ok_city = city.is_empty() || name_n.contains(&city);
                (ok_state && ok_city).then(|| name.to_string())
            })
            .collect();

        if names.is_empty() {
            Err(SourceError::Empty)
        } else {
            Ok(names)
        }
    }
}

impl Source<InstitutionQuery> for UniversityDirectory {
    fn name(&self) -> &'static str {
        "university-directory"
    }

    fn query<'a>(&'a self, ctx: &'a InstitutionQuery) -> SourceFut<'a, Vec<String>> {
        Box::pin(self.fetch(ctx))
    }
}
