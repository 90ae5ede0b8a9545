//! Core domain types for the enrol resolver.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

#![allow(clippy::missing_errors_doc)]

mod candidate;
pub use candidate::{
    Candidate, CandidateList, OVERRIDE_LABEL, OVERRIDE_MARKER, is_override_marker,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Hierarchy
// ============================================================================

/// A level of the state -> city -> institution hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    State,
    City,
    Institution,
}

impl Level {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::State => "state",
            Level::City => "city",
            Level::Institution => "institution",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one level's candidate list.
///
/// ```text
/// Idle -> Loading -> Resolved | Fallback | OverrideRequired
/// ```
///
/// Everything except `Loading` is terminal: the list is usable and the
/// override path is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No upstream value yet; the list is a placeholder.
    #[default]
    Idle,
    /// A request is in flight. Any list already shown stays usable.
    Loading,
    /// An authoritative source produced candidates.
    Resolved,
    /// Candidates came from an embedded table.
    Fallback,
    /// Nothing was found; the override entry is selected and its input revealed.
    OverrideRequired,
}

impl Phase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Phase::Loading)
    }
}

/// Issued when a level starts loading. A response is applied only while its
/// token is still the level's newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    level: Level,
    generation: u64,
}

impl RequestToken {
    #[must_use]
    pub const fn new(level: Level, generation: u64) -> Self {
        Self { level, generation }
    }

    #[must_use]
    pub const fn level(self) -> Level {
        self.level
    }

    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

// ============================================================================
// Academic records
// ============================================================================

/// Academic level of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DegreeLevel {
    #[default]
    #[serde(rename = "UG")]
    Undergraduate,
    #[serde(rename = "PG")]
    Postgraduate,
}

impl DegreeLevel {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            DegreeLevel::Undergraduate => "UG",
            DegreeLevel::Postgraduate => "PG",
        }
    }

    /// Lenient parse; anything unrecognised is treated as undergraduate.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pg" | "postgraduate" | "post-graduate" => DegreeLevel::Postgraduate,
            _ => DegreeLevel::Undergraduate,
        }
    }
}

impl fmt::Display for DegreeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Context for an institution lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstitutionQuery {
    pub state: String,
    pub city: String,
    pub degree_level: DegreeLevel,
    pub degree_name: String,
}

impl InstitutionQuery {
    /// Builds a query with every text field trimmed.
    #[must_use]
    pub fn new(
        state: impl AsRef<str>,
        city: impl AsRef<str>,
        degree_level: DegreeLevel,
        degree_name: impl AsRef<str>,
    ) -> Self {
        Self {
            state: state.as_ref().trim().to_string(),
            city: city.as_ref().trim().to_string(),
            degree_level,
            degree_name: degree_name.as_ref().trim().to_string(),
        }
    }
}

// ============================================================================
// Postal lookup
// ============================================================================

/// A state/city pair resolved from a postal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalLocation {
    pub state: String,
    /// Postal district; used as the city.
    pub city: String,
    pub country: String,
}

/// Rejection of a postal code before any lookup is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinCodeError {
    #[error("postal code must be 6 digits, got {0} characters")]
    Length(usize),
    #[error("postal code must contain only digits")]
    NonDigit,
    #[error("postal code cannot start with 0")]
    LeadingZero,
}

/// A validated 6-digit Indian PIN code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinCode(String);

impl PinCode {
    pub fn parse(raw: &str) -> Result<Self, PinCodeError> {
        let code: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if code.chars().count() != 6 {
            return Err(PinCodeError::Length(code.chars().count()));
        }
        if !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(PinCodeError::NonDigit);
        }
        if code.starts_with('0') {
            return Err(PinCodeError::LeadingZero);
        }
        Ok(Self(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Source failures
// ============================================================================

/// Why a source produced no usable candidates.
///
/// Every variant is handled the same way by callers: move on to the next
/// source. The distinction exists for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Transport failure or a non-success status after retries.
    #[error("source unavailable: {0}")]
    Unavailable(String),
    /// Reachable, but zero matches.
    #[error("source returned no results")]
    Empty,
    /// The response did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SourceError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            SourceError::Unavailable(_) => "unavailable",
            SourceError::Empty => "empty",
            SourceError::Malformed(_) => "malformed",
        }
    }
}
