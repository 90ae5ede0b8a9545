//! Client for the portal's own lookup endpoints.
//!
//! | Endpoint | Answer |
//! |----------|--------|
//! | `GET /api/cities/?state=` | `{"cities": [string]}` |
//! | `GET /api/institutions/?state=&city=&level=&degree=` | `{"institutions": [string]}` |
//! | `GET /api/degrees/?level=` | `{"degrees": [string]}` |
//! | `GET /api/years/` | `{"years": [int]}` |

use enrol_types::{DegreeLevel, InstitutionQuery, SourceError};
use serde::Deserialize;
use url::Url;

use crate::http::{HttpFetcher, endpoint};
use crate::{Source, SourceFut};

#[derive(Deserialize)]
struct CitiesResponse {
    #[serde(default)]
    cities: Vec<String>,
}

#[derive(Deserialize)]
struct InstitutionsResponse {
    #[serde(default)]
    institutions: Vec<String>,
}

#[derive(Deserialize)]
struct DegreesResponse {
    #[serde(default)]
    degrees: Vec<String>,
}

#[derive(Deserialize)]
struct YearsResponse {
    #[serde(default)]
    years: Vec<i32>,
}

/// Shared connection details; hand out typed sources with the accessors.
#[derive(Debug, Clone)]
pub struct InternalDirectory {
    fetcher: HttpFetcher,
    base: String,
}

impl InternalDirectory {
    pub fn new(fetcher: HttpFetcher, base: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
        }
    }

    #[must_use]
    pub fn cities(&self) -> InternalCities {
        InternalCities(self.clone())
    }

    #[must_use]
    pub fn institutions(&self) -> InternalInstitutions {
        InternalInstitutions(self.clone())
    }

    #[must_use]
    pub fn degrees(&self) -> InternalDegrees {
        InternalDegrees(self.clone())
    }

    #[must_use]
    pub fn years(&self) -> InternalYears {
        InternalYears(self.clone())
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, SourceError> {
        let mut url = endpoint(&self.base, path)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn non_empty<T>(values: Vec<T>) -> Result<Vec<T>, SourceError> {
    if values.is_empty() {
        Err(SourceError::Empty)
    } else {
        Ok(values)
    }
}

fn clean(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub struct InternalCities(InternalDirectory);

impl InternalCities {
    async fn fetch(&self, state: &str) -> Result<Vec<String>, SourceError> {
        let state = state.trim();
        if state.is_empty() {
            return Err(SourceError::Empty);
        }
        let url = self.0.url("api/cities/", &[("state", state)])?;
        let response: CitiesResponse = self.0.fetcher.get_json(url).await?;
        non_empty(clean(response.cities))
    }
}

impl Source<str> for InternalCities {
    fn name(&self) -> &'static str {
        "internal-cities"
    }

    fn query<'a>(&'a self, state: &'a str) -> SourceFut<'a, Vec<String>> {
        Box::pin(self.fetch(state))
    }
}

#[derive(Debug, Clone)]
pub struct InternalInstitutions(InternalDirectory);

impl InternalInstitutions {
    async fn fetch(&self, query: &InstitutionQuery) -> Result<Vec<String>, SourceError> {
        let url = self.0.url(
            "api/institutions/",
            &[
                ("state", query.state.as_str()),
                ("city", query.city.as_str()),
                ("level", query.degree_level.code()),
                ("degree", query.degree_name.as_str()),
            ],
        )?;
        let response: InstitutionsResponse = self.0.fetcher.get_json(url).await?;
        non_empty(clean(response.institutions))
    }
}

impl Source<InstitutionQuery> for InternalInstitutions {
    fn name(&self) -> &'static str {
        "internal-institutions"
    }

    fn query<'a>(&'a self, ctx: &'a InstitutionQuery) -> SourceFut<'a, Vec<String>> {
        Box::pin(self.fetch(ctx))
    }
}

#[derive(Debug, Clone)]
pub struct InternalDegrees(InternalDirectory);

impl InternalDegrees {
    async fn fetch(&self, level: DegreeLevel) -> Result<Vec<String>, SourceError> {
        let url = self.0.url("api/degrees/", &[("level", level.code())])?;
        let response: DegreesResponse = self.0.fetcher.get_json(url).await?;
        non_empty(clean(response.degrees))
    }
}

impl Source<DegreeLevel> for InternalDegrees {
    fn name(&self) -> &'static str {
        "internal-degrees"
    }

    fn query<'a>(&'a self, level: &'a DegreeLevel) -> SourceFut<'a, Vec<String>> {
        Box::pin(self.fetch(*level))
    }
}

#[derive(Debug, Clone)]
pub struct InternalYears(InternalDirectory);

impl InternalYears {
    async fn fetch(&self) -> Result<Vec<i32>, SourceError> {
        let url = self.0.url("api/years/", &[])?;
        let response: YearsResponse = self.0.fetcher.get_json(url).await?;
        non_empty(response.years)
    }
}

impl Source<(), i32> for InternalYears {
    fn name(&self) -> &'static str {
        "internal-years"
    }

    fn query<'a>(&'a self, _ctx: &'a ()) -> SourceFut<'a, Vec<i32>> {
        Box::pin(self.fetch())
    }
}
