//! One hierarchy level: its candidate list, selection and override input.

use enrol_types::{
    CandidateList, Level, OVERRIDE_MARKER, Phase, RequestToken, is_override_marker,
};

use crate::reconcile::{Reconciliation, reconcile_override};

/// Which part of the form an update is for.
///
/// Institutions are per academic-record row; rows are append-only, so the
/// index stays valid for the life of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    States,
    Cities,
    Institutions(usize),
}

impl Target {
    #[must_use]
    pub const fn level(self) -> Level {
        match self {
            Target::States => Level::State,
            Target::Cities => Level::City,
            Target::Institutions(_) => Level::Institution,
        }
    }
}

/// A load that has been started: what it is for and the context to query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest<C> {
    pub target: Target,
    pub token: RequestToken,
    pub context: C,
}

/// The result of a load, to be handed back to the level that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUpdate {
    pub target: Target,
    pub token: RequestToken,
    pub phase: Phase,
    /// `None` keeps the list already shown.
    pub candidates: Option<CandidateList>,
    /// Source that answered, for logging.
    pub source: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Applied {
    Applied,
    /// A newer request was issued since this one; nothing changed.
    Stale,
}

/// State machine for a single level.
///
/// ```text
/// Idle ──begin_load──> Loading ──apply──> Resolved | Fallback | OverrideRequired
///   ^                                                     │
///   └───────────────────────── reset ─────────────────────┘
/// ```
#[derive(Debug, Clone)]
pub struct LevelState {
    level: Level,
    phase: Phase,
    candidates: CandidateList,
    selected: Option<String>,
    override_text: String,
    override_visible: bool,
    generation: u64,
}

impl LevelState {
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            level,
            phase: Phase::Idle,
            candidates: CandidateList::empty(),
            selected: None,
            override_text: String::new(),
            override_visible: false,
            generation: 0,
        }
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    /// The selected entry's value; may be the override marker.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn override_text(&self) -> &str {
        &self.override_text
    }

    #[must_use]
    pub fn override_visible(&self) -> bool {
        self.override_visible
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_override_selected(&self) -> bool {
        self.selected.as_deref().is_some_and(is_override_marker)
    }

    /// Shows a list without going through a load, e.g. an embedded table.
    pub(crate) fn seed(&mut self, phase: Phase, candidates: CandidateList) {
        self.phase = phase;
        self.candidates = candidates;
    }

    /// Starts a load. The current list stays usable until the answer lands.
    pub fn begin_load(&mut self) -> RequestToken {
        self.generation += 1;
        self.phase = Phase::Loading;
        RequestToken::new(self.level, self.generation)
    }

    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        token.level() == self.level && token.generation() == self.generation
    }

    pub fn apply(&mut self, update: LevelUpdate) -> Applied {
        if !self.is_current(update.token) {
            tracing::info!(
                level = %self.level,
                stale = update.token.generation(),
                current = self.generation,
                "Discarding stale response"
            );
            return Applied::Stale;
        }

        if let Some(candidates) = update.candidates {
            self.candidates = candidates;
        }
        self.phase = update.phase;

        if self.phase == Phase::OverrideRequired {
            self.selected = Some(OVERRIDE_MARKER.to_string());
            self.override_visible = true;
        } else {
            self.retain_selection();
        }

        tracing::debug!(
            level = %self.level,
            phase = ?self.phase,
            source = update.source.unwrap_or("none"),
            count = self.candidates.genuine_len(),
            "Applied candidates"
        );
        Applied::Applied
    }

    /// Keeps the user's choice across a list replacement.
    ///
    /// A genuine value survives only if the new list still offers it; a
    /// selected marker survives only if the new list has one. Anything else
    /// is cleared so the list always describes what can be picked.
    fn retain_selection(&mut self) {
        let Some(selected) = self.selected.as_deref() else {
            return;
        };
        let offered = if is_override_marker(selected) {
            self.candidates.has_override()
        } else {
            self.candidates.contains(selected)
        };
        if !offered {
            tracing::debug!(level = %self.level, value = selected, "Cleared selection missing from new list");
            self.selected = None;
            self.override_text.clear();
            self.override_visible = false;
        }
    }

    /// Back to the empty placeholder. Any load in flight becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = Phase::Idle;
        self.candidates = CandidateList::empty();
        self.selected = None;
        self.override_text.clear();
        self.override_visible = false;
    }

    /// Selects an entry of the current list. Returns false if it is not offered.
    pub fn select(&mut self, value: &str) -> bool {
        if is_override_marker(value) {
            if !self.candidates.has_override() {
                return false;
            }
            self.selected = Some(OVERRIDE_MARKER.to_string());
            self.override_visible = true;
            return true;
        }
        if !self.candidates.contains(value) {
            return false;
        }
        self.selected = Some(value.to_string());
        self.override_text.clear();
        self.override_visible = false;
        true
    }

    /// Selects `value`, adding it to the list first if needed.
    pub fn select_or_insert(&mut self, value: &str) -> bool {
        if !is_override_marker(value) {
            self.candidates.insert_genuine(value);
        }
        self.select(value)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.override_text.clear();
        self.override_visible = false;
    }

    pub fn set_override_text(&mut self, text: &str) {
        self.override_text = text.to_string();
    }

    /// The value this level contributes right now, without mutating anything.
    ///
    /// With the marker selected this is the trimmed override text, or `None`
    /// while nothing has been typed.
    #[must_use]
    pub fn resolved_value(&self) -> Option<&str> {
        match self.selected.as_deref() {
            Some(marker) if is_override_marker(marker) => {
                let text = self.override_text.trim();
                (!text.is_empty()).then_some(text)
            }
            other => other,
        }
    }

    /// Turns an active override into a concrete, selected candidate.
    pub fn reconcile(&mut self) -> Reconciliation {
        let outcome = reconcile_override(
            self.level,
            &mut self.candidates,
            &mut self.selected,
            &self.override_text,
        );
        if matches!(outcome, Reconciliation::Injected(_)) {
            self.override_text.clear();
            self.override_visible = false;
        }
        outcome
    }
}
