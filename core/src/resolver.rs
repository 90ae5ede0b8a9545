//! Resolver operations.
//!
//! Every load is split in three so that a caller can keep handling user
//! events while a request is in flight:
//!
//! 1. `ResolutionState::request_*` bumps the level's generation and returns a
//!    [`LoadRequest`] carrying the token and the query context.
//! 2. `Resolver::fetch_*` walks the source chain. It never fails and does not
//!    touch the form.
//! 3. `ResolutionState::apply` lands the [`LevelUpdate`], or discards it if a
//!    newer request was issued in the meantime.
//!
//! The `load_*` methods compose the three for callers that simply await.

use chrono::Datelike;
use enrol_config::{EnrolConfig, RegionConfig};
use enrol_providers::{ChainOutcome, embedded};
use enrol_types::{CandidateList, DegreeLevel, InstitutionQuery, Phase, PinCode, PostalLocation};

use crate::level::{Applied, LevelUpdate, LoadRequest};
use crate::sources::{SetupError, Sources};
use crate::state::ResolutionState;

/// Region-specific knobs that are not sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Degree offered at undergraduate level even if no catalog lists it.
    pub injected_ug_degree: String,
    /// Oldest year in the generated year list.
    pub year_floor: i32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&RegionConfig::default())
    }
}

impl From<&RegionConfig> for ResolverSettings {
    fn from(region: &RegionConfig) -> Self {
        Self {
            injected_ug_degree: region.injected_ug_degree.trim().to_string(),
            year_floor: region.year_floor,
        }
    }
}

#[derive(Debug)]
pub struct Resolver {
    sources: Sources,
    settings: ResolverSettings,
}

impl Resolver {
    #[must_use]
    pub fn new(sources: Sources, settings: ResolverSettings) -> Self {
        Self { sources, settings }
    }

    pub fn from_config(config: &EnrolConfig) -> Result<Self, SetupError> {
        Ok(Self::new(
            Sources::from_config(config)?,
            ResolverSettings::from(&config.region),
        ))
    }

    #[must_use]
    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    #[must_use]
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // States
    // ------------------------------------------------------------------

    /// Asks the state directory. On failure the embedded list stays.
    pub async fn fetch_states(&self, request: LoadRequest<()>) -> LevelUpdate {
        let outcome = self.sources.states.first_non_empty(&request.context).await;
        let (phase, candidates, source) = match outcome {
            ChainOutcome::Found { source, values, .. } => {
                let list = CandidateList::with_override(values);
                if list.genuine_len() > 0 {
                    (Phase::Resolved, Some(list), Some(source))
                } else {
                    tracing::info!(source, "State directory gave only blank names, keeping embedded list");
                    (Phase::Fallback, None, None)
                }
            }
            ChainOutcome::Exhausted { failures } => {
                tracing::info!(
                    tried = failures.len(),
                    "State directory unavailable, keeping embedded list"
                );
                (Phase::Fallback, None, None)
            }
        };

        LevelUpdate {
            target: request.target,
            token: request.token,
            phase,
            candidates,
            source,
        }
    }

    /// Seeds the embedded state list, then replaces it with the directory's.
    ///
    /// The list is usable from the first line: [`ResolutionState::seed_states`]
    /// runs before anything is awaited.
    pub async fn load_states(&self, state: &mut ResolutionState) -> Applied {
        let request = state.request_states();
        let update = self.fetch_states(request).await;
        state.apply(update)
    }

    // ------------------------------------------------------------------
    // Cities
    // ------------------------------------------------------------------

    /// Cities for `request.context`, in the order the answering source gave.
    pub async fn fetch_cities(&self, request: LoadRequest<String>) -> LevelUpdate {
        let outcome = self.sources.cities.first_non_empty(&request.context).await;
        candidates_update(request, outcome, false)
    }

    /// Loads cities for the selected state.
    ///
    /// Returns `None` when no state is selected; the city level is then back
    /// to its empty placeholder.
    pub async fn load_cities(&self, state: &mut ResolutionState) -> Option<Applied> {
        let request = state.request_cities()?;
        let update = self.fetch_cities(request).await;
        Some(state.apply(update))
    }

    // ------------------------------------------------------------------
    // Institutions
    // ------------------------------------------------------------------

    /// Institutions for a row's query: deduplicated and sorted.
    pub async fn fetch_institutions(&self, request: LoadRequest<InstitutionQuery>) -> LevelUpdate {
        let outcome = self.sources.institutions.first_non_empty(&request.context).await;
        candidates_update(request, outcome, true)
    }

    /// Loads institutions for `row`. `None` if the row does not exist or no
    /// state is resolved yet.
    pub async fn load_institutions(
        &self,
        state: &mut ResolutionState,
        row: usize,
    ) -> Option<Applied> {
        let request = state.request_institutions(row)?;
        let update = self.fetch_institutions(request).await;
        Some(state.apply(update))
    }

    // ------------------------------------------------------------------
    // Postal autofill
    // ------------------------------------------------------------------

    /// Fills the state (and, once loaded, the city) from a PIN code.
    ///
    /// An invalid code, a disabled or failing lookup, or an answer without a
    /// state leaves the form untouched and returns `None`.
    pub async fn autofill_from_postal(
        &self,
        state: &mut ResolutionState,
        raw_code: &str,
    ) -> Option<PostalLocation> {
        let code = match PinCode::parse(raw_code) {
            Ok(code) => code,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring postal code");
                return None;
            }
        };
        let postal = self.sources.postal.as_ref()?;

        let location = match postal.lookup(&code).await {
            Ok(location) => location,
            Err(e) => {
                tracing::info!(source = postal.name(), %code, kind = e.kind(), %e, "Postal lookup failed");
                return None;
            }
        };

        if !state.apply_postal(&location) {
            return None;
        }
        // Applied or stale, the form is consistent either way.
        let _ = self.load_cities(state).await;
        Some(location)
    }

    // ------------------------------------------------------------------
    // Degrees and years
    // ------------------------------------------------------------------

    /// Degree names for `level`. The configured undergraduate degree is always
    /// present in the undergraduate list.
    pub async fn load_degrees(&self, level: DegreeLevel) -> Vec<String> {
        let mut degrees = self.sources.degrees.first_non_empty(&level).await.into_values();
        let injected = self.settings.injected_ug_degree.as_str();
        if level == DegreeLevel::Undergraduate
            && !injected.is_empty()
            && !degrees.iter().any(|d| d == injected)
        {
            degrees.push(injected.to_string());
        }
        degrees
    }

    /// Graduation years, newest first.
    pub async fn load_years(&self) -> Vec<i32> {
        match self.sources.years.first_non_empty(&()).await {
            ChainOutcome::Found { values, .. } => values,
            ChainOutcome::Exhausted { .. } => {
                let current = chrono::Utc::now().year();
                embedded::years(current, self.settings.year_floor)
            }
        }
    }
}

/// Turns a chain outcome into an update for a city or institution list.
///
/// Both lists always end with the override entry; an empty outcome leaves
/// nothing else and requires the override.
fn candidates_update<C>(
    request: LoadRequest<C>,
    outcome: ChainOutcome<String>,
    sort: bool,
) -> LevelUpdate {
    let level = request.target.level();
    let (phase, candidates, source) = match outcome {
        ChainOutcome::Found {
            source,
            embedded,
            mut values,
            ..
        } => {
            if sort {
                values.sort();
                values.dedup();
            }
            let list = CandidateList::with_override(values);
            let phase = if list.genuine_len() == 0 {
                Phase::OverrideRequired
            } else if embedded {
                tracing::info!(%level, source, "Using embedded fallback");
                Phase::Fallback
            } else {
                Phase::Resolved
            };
            (phase, list, Some(source))
        }
        ChainOutcome::Exhausted { failures } => {
            tracing::info!(%level, tried = failures.len(), "No source answered, override required");
            (Phase::OverrideRequired, CandidateList::override_only(), None)
        }
    };

    LevelUpdate {
        target: request.target,
        token: request.token,
        phase,
        candidates: Some(candidates),
        source,
    }
}
