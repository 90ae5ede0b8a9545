//! State and city names from the countriesnow.space API.
//!
//! Both endpoints take a JSON POST and wrap their answer in
//! `{"error": bool, "msg": string, "data": ...}`.

use enrol_types::SourceError;
use serde::{Deserialize, Serialize};

use crate::http::{HttpFetcher, endpoint};
use crate::{Source, SourceFut};

#[derive(Serialize)]
struct CountryRequest<'a> {
    country: &'a str,
}

#[derive(Serialize)]
struct StateRequest<'a> {
    country: &'a str,
    state: &'a str,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, SourceError> {
        if self.error {
            // The API answers unknown states with error=true; treat as no data.
            tracing::debug!(msg = ?self.msg, "countriesnow reported an error");
            return Err(SourceError::Empty);
        }
        self.data
            .ok_or_else(|| SourceError::Malformed("missing data".to_string()))
    }
}

#[derive(Deserialize)]
struct StatesData {
    #[serde(default)]
    states: Vec<NamedState>,
}

#[derive(Deserialize)]
struct NamedState {
    name: Option<String>,
}

/// Authoritative list of states for a country.
#[derive(Debug, Clone)]
pub struct CountriesNowStates {
    fetcher: HttpFetcher,
    base: String,
    country: String,
}

impl CountriesNowStates {
    pub fn new(fetcher: HttpFetcher, base: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
            country: country.into(),
        }
    }

    async fn fetch(&self) -> Result<Vec<String>, SourceError> {
        let url = endpoint(&self.base, "countries/states")?;
        let body = CountryRequest {
            country: &self.country,
        };
        let envelope: Envelope<StatesData> = self.fetcher.post_json(url, &body).await?;

        let mut states: Vec<String> = envelope
            .into_data()?
            .states
            .into_iter()
            .filter_map(|s| s.name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        states.sort();
        states.dedup();

        if states.is_empty() {
            Err(SourceError::Empty)
        } else {
            Ok(states)
        }
    }
}

impl Source<()> for CountriesNowStates {
    fn name(&self) -> &'static str {
        "countriesnow-states"
    }

    fn query<'a>(&'a self, _ctx: &'a ()) -> SourceFut<'a, Vec<String>> {
        Box::pin(self.fetch())
    }
}

/// Cities within one state.
#[derive(Debug, Clone)]
pub struct CountriesNowCities {
    fetcher: HttpFetcher,
    base: String,
    country: String,
}

impl CountriesNowCities {
    pub fn new(fetcher: HttpFetcher, base: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
            country: country.into(),
        }
    }

    async fn fetch(&self, state: &str) -> Result<Vec<String>, SourceError> {
        let state = state.trim();
        if state.is_empty() {
            return Err(SourceError::Empty);
        }

        let url = endpoint(&self.base, "countries/state/cities")?;
        let body = StateRequest {
            country: &self.country,
            state,
        };
        let envelope: Envelope<Vec<serde_json::Value>> = self.fetcher.post_json(url, &body).await?;

        // Non-string entries have been seen in the wild; skip them.
        let mut cities: Vec<String> = envelope
            .into_data()?
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect();
        cities.sort();
        cities.dedup();

        if cities.is_empty() {
            Err(SourceError::Empty)
        } else {
            Ok(cities)
        }
    }
}

impl Source<str> for CountriesNowCities {
    fn name(&self) -> &'static str {
        "countriesnow-cities"
    }

    fn query<'a>(&'a self, state: &'a str) -> SourceFut<'a, Vec<String>> {
        Box::pin(self.fetch(state))
    }
}
