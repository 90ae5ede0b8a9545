//! Submission-time reconciliation of manual overrides.

use enrol_types::{CandidateList, Level, is_override_marker};

/// What a level contributes after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// A genuine candidate was already selected.
    Selected(String),
    /// The override text became a candidate and is now selected.
    Injected(String),
    /// The marker is selected but no text was typed.
    Unresolved,
    /// Nothing is selected.
    Unselected,
}

impl Reconciliation {
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Reconciliation::Selected(v) | Reconciliation::Injected(v) => Some(v),
            Reconciliation::Unresolved | Reconciliation::Unselected => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<String> {
        match self {
            Reconciliation::Selected(v) | Reconciliation::Injected(v) => Some(v),
            Reconciliation::Unresolved | Reconciliation::Unselected => None,
        }
    }
}

/// Replaces a selected override marker with the typed text.
///
/// The trimmed text is added to `candidates` (before the marker, unless an
/// exact match already exists) and becomes the selection. Calling this again
/// changes nothing: the selection is then a genuine candidate.
pub fn reconcile_override(
    level: Level,
    candidates: &mut CandidateList,
    selected: &mut Option<String>,
    manual_text: &str,
) -> Reconciliation {
    let Some(current) = selected.as_deref() else {
        return Reconciliation::Unselected;
    };
    if !is_override_marker(current) {
        return Reconciliation::Selected(current.to_string());
    }

    let text = manual_text.trim();
    if text.is_empty() || is_override_marker(text) {
        tracing::debug!(%level, "Override selected without text");
        return Reconciliation::Unresolved;
    }

    candidates.insert_genuine(text);
    *selected = Some(text.to_string());
    tracing::debug!(%level, value = text, "Reconciled override");
    Reconciliation::Injected(text.to_string())
}

/// Combined `"{city}, {state}"` label.
///
/// An active city override (`city_selection` is the marker) contributes the
/// trimmed override text instead. A side that is missing, blank or still the
/// bare marker is left out; with neither side the result is empty.
#[must_use]
pub fn reconcile_city_state(
    state_selection: Option<&str>,
    city_selection: Option<&str>,
    city_override_text: &str,
) -> String {
    let state = state_selection
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_override_marker(s));
    let city = match city_selection {
        Some(c) if is_override_marker(c) => Some(city_override_text.trim()),
        other => other.map(str::trim),
    }
    .filter(|c| !c.is_empty() && !is_override_marker(c));

    match (city, state) {
        (Some(city), Some(state)) => format!("{city}, {state}"),
        (Some(one), None) | (None, Some(one)) => one.to_string(),
        (None, None) => String::new(),
    }
}
