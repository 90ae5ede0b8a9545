//! Postal PIN code lookup (api.postalpincode.in).
//!
//! `GET /pincode/{code}` answers with a one-element array:
//! `[{"Status": "Success", "PostOffice": [{"District", "State", "Country"}]}]`.
//! The first post office is taken as representative.

use enrol_types::{PinCode, PostalLocation, SourceError};
use serde::Deserialize;

use crate::http::{HttpFetcher, endpoint};
use crate::{PostalSource, SourceFut};

#[derive(Deserialize)]
struct LookupResult {
    #[serde(rename = "Status")]
    status: Option<String>,
    #[serde(rename = "PostOffice")]
    post_offices: Option<Vec<PostOffice>>,
}

#[derive(Deserialize)]
struct PostOffice {
    #[serde(rename = "District", default)]
    district: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Country")]
    country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PincodeLookup {
    fetcher: HttpFetcher,
    base: String,
    default_country: String,
}

impl PincodeLookup {
    pub fn new(
        fetcher: HttpFetcher,
        base: impl Into<String>,
        default_country: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            base: base.into(),
            default_country: default_country.into(),
        }
    }

    async fn fetch(&self, code: &PinCode) -> Result<PostalLocation, SourceError> {
        let url = endpoint(&self.base, &format!("pincode/{code}"))?;
        let results: Vec<LookupResult> = self.fetcher.get_json(url).await?;

        let Some(first) = results.into_iter().next() else {
            return Err(SourceError::Malformed("empty result array".to_string()));
        };
        if !first
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("success"))
        {
            return Err(SourceError::Empty);
        }

        let office = first
            .post_offices
            .and_then(|offices| offices.into_iter().next())
            .ok_or(SourceError::Empty)?;

        let state = office.state.trim().to_string();
        if state.is_empty() {
            return Err(SourceError::Empty);
        }

        Ok(PostalLocation {
            state,
            city: office.district.trim().to_string(),
            country: office
                .country
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| self.default_country.clone()),
        })
    }
}

impl PostalSource for PincodeLookup {
    fn name(&self) -> &'static str {
        "postal-pincode"
    }

    fn lookup<'a>(&'a self, code: &'a PinCode) -> SourceFut<'a, PostalLocation> {
        Box::pin(self.fetch(code))
    }
}
