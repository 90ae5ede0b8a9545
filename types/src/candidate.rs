//! Candidate lists: the selectable options shown for one hierarchy level.

use serde::{Deserialize, Serialize};

/// Reserved value of the manual-override entry.
pub const OVERRIDE_MARKER: &str = "__OTHER__";

/// Label shown for the manual-override entry.
pub const OVERRIDE_LABEL: &str = "Other (type manually)";

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub value: String,
    pub is_manual_override: bool,
}

impl Candidate {
    #[must_use]
    pub fn genuine(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            is_manual_override: false,
        }
    }

    #[must_use]
    pub fn manual_override() -> Self {
        Self {
            value: OVERRIDE_MARKER.to_string(),
            is_manual_override: true,
        }
    }

    /// Text a user would see for this option.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.is_manual_override {
            OVERRIDE_LABEL
        } else {
            &self.value
        }
    }
}

/// Returns true if `value` is the override marker token.
#[must_use]
pub fn is_override_marker(value: &str) -> bool {
    value == OVERRIDE_MARKER
}

/// Ordered options for one level.
///
/// Lists built from a dynamic source carry exactly one override entry, always
/// last. Lists built from an embedded fallback (the state list) may carry none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateList {
    entries: Vec<Candidate>,
}

impl CandidateList {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Genuine candidates followed by the terminal override entry.
    ///
    /// Blank values and stray marker tokens from a source are dropped.
    #[must_use]
    pub fn with_override<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::without_override(values);
        list.entries.push(Candidate::manual_override());
        list
    }

    /// Genuine candidates only; used for embedded fallback lists.
    #[must_use]
    pub fn without_override<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = values
            .into_iter()
            .map(Into::into)
            .filter(|v: &String| !v.trim().is_empty() && !is_override_marker(v))
            .map(Candidate::genuine)
            .collect();
        Self { entries }
    }

    /// A list holding nothing but the override entry.
    #[must_use]
    pub fn override_only() -> Self {
        Self {
            entries: vec![Candidate::manual_override()],
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[Candidate] {
        &self.entries
    }

    /// Values in order, including the marker token if present.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        self.entries.iter().map(|c| c.value.as_str()).collect()
    }

    pub fn genuine(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter().filter(|c| !c.is_manual_override)
    }

    #[must_use]
    pub fn genuine_len(&self) -> usize {
        self.genuine().count()
    }

    #[must_use]
    pub fn has_override(&self) -> bool {
        self.entries.iter().any(|c| c.is_manual_override)
    }

    /// Exact match against a genuine candidate.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.genuine().any(|c| c.value == value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a genuine candidate unless an exact match exists.
    ///
    /// Inserted just before the override entry so the marker stays last.
    /// Returns true if the list changed.
    pub fn insert_genuine(&mut self, value: &str) -> bool {
        if value.trim().is_empty() || is_override_marker(value) || self.contains(value) {
            return false;
        }
        let at = self
            .entries
            .iter()
            .position(|c| c.is_manual_override)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, Candidate::genuine(value));
        true
    }
}
