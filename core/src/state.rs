//! Form-wide resolution state.
//!
//! One [`ResolutionState`] exists per open form. It owns a [`LevelState`] for
//! the state and city levels plus one per academic-record row, and it is the
//! only place selections change. Resolver operations borrow it mutably; there
//! is no shared or global state.
//!
//! Any change to an upstream level's value invalidates everything below it:
//! a new state clears the city and every row's institution, a new city clears
//! the institutions. Loads in flight for the cleared levels become stale.

use enrol_providers::embedded;
use enrol_types::{
    CandidateList, DegreeLevel, InstitutionQuery, Level, OVERRIDE_MARKER, Phase, PostalLocation,
};

use crate::level::{Applied, LevelState, LevelUpdate, LoadRequest, Target};
use crate::reconcile::reconcile_city_state;
use crate::submission::{AcademicRecord, Submission};

/// One academic-record row: a degree and where it was earned.
#[derive(Debug, Clone)]
pub struct AcademicRow {
    pub degree_level: DegreeLevel,
    pub degree_name: String,
    pub year: Option<i32>,
    institution: LevelState,
}

impl AcademicRow {
    fn new(degree_level: DegreeLevel, degree_name: &str) -> Self {
        Self {
            degree_level,
            degree_name: degree_name.trim().to_string(),
            year: None,
            institution: LevelState::new(Level::Institution),
        }
    }

    #[must_use]
    pub fn institution(&self) -> &LevelState {
        &self.institution
    }
}

#[derive(Debug, Clone)]
pub struct ResolutionState {
    states: LevelState,
    cities: LevelState,
    rows: Vec<AcademicRow>,
    /// District from a postal lookup, selected once the city list arrives.
    pending_city: Option<String>,
}

impl Default for ResolutionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: LevelState::new(Level::State),
            cities: LevelState::new(Level::City),
            rows: Vec::new(),
            pending_city: None,
        }
    }

    #[must_use]
    pub fn states(&self) -> &LevelState {
        &self.states
    }

    #[must_use]
    pub fn cities(&self) -> &LevelState {
        &self.cities
    }

    #[must_use]
    pub fn rows(&self) -> &[AcademicRow] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&AcademicRow> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn pending_city(&self) -> Option<&str> {
        self.pending_city.as_deref()
    }

    /// Effective state: the selection, or the typed override.
    #[must_use]
    pub fn state_value(&self) -> Option<&str> {
        self.states.resolved_value()
    }

    #[must_use]
    pub fn city_value(&self) -> Option<&str> {
        self.cities.resolved_value()
    }

    // ------------------------------------------------------------------
    // States
    // ------------------------------------------------------------------

    /// Shows the embedded state list if nothing is shown yet.
    ///
    /// Synchronous, so the state picker is usable before any network call.
    pub fn seed_states(&mut self) {
        if self.states.candidates().is_empty() {
            self.states.seed(
                Phase::Fallback,
                CandidateList::without_override(embedded::STATES.iter().copied()),
            );
        }
    }

    pub fn request_states(&mut self) -> LoadRequest<()> {
        self.seed_states();
        LoadRequest {
            target: Target::States,
            token: self.states.begin_load(),
            context: (),
        }
    }

    /// User picked a state. Returns false if it is not offered.
    pub fn select_state(&mut self, value: &str) -> bool {
        let before = self.state_value().map(str::to_owned);
        if !self.states.select(value) {
            return false;
        }
        self.pending_city = None;
        self.state_changed(before.as_deref());
        true
    }

    /// Selects a state given as text, adding it to the list if absent.
    pub fn choose_state(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.seed_states();
        let before = self.state_value().map(str::to_owned);
        if !self.states.select_or_insert(value) {
            return false;
        }
        self.pending_city = None;
        self.state_changed(before.as_deref());
        true
    }

    pub fn set_state_override(&mut self, text: &str) {
        let before = self.state_value().map(str::to_owned);
        self.states.set_override_text(text);
        self.state_changed(before.as_deref());
    }

    fn state_changed(&mut self, before: Option<&str>) {
        if self.state_value() != before {
            tracing::debug!(from = ?before, to = ?self.state_value(), "State changed");
            self.invalidate_cities();
        }
    }

    fn invalidate_cities(&mut self) {
        self.cities.reset();
        self.invalidate_institutions();
    }

    // ------------------------------------------------------------------
    // Cities
    // ------------------------------------------------------------------

    /// Starts a city load for the current state.
    ///
    /// Without a state the city level goes back to its placeholder and `None`
    /// is returned.
    pub fn request_cities(&mut self) -> Option<LoadRequest<String>> {
        let Some(state) = self.state_value().map(str::to_owned) else {
            self.invalidate_cities();
            return None;
        };
        Some(LoadRequest {
            target: Target::Cities,
            token: self.cities.begin_load(),
            context: state,
        })
    }

    pub fn select_city(&mut self, value: &str) -> bool {
        let before = self.city_value().map(str::to_owned);
        if !self.cities.select(value) {
            return false;
        }
        self.city_changed(before.as_deref());
        true
    }

    /// Selects a city given as text.
    ///
    /// An offered city is matched case-insensitively; anything else goes
    /// through the override entry with `value` as its text.
    pub fn choose_city(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        let offered = self
            .cities
            .candidates()
            .genuine()
            .find(|c| c.value.eq_ignore_ascii_case(value))
            .map(|c| c.value.clone());
        match offered {
            Some(city) => self.select_city(&city),
            None => {
                if !self.select_city(OVERRIDE_MARKER) {
                    return false;
                }
                self.set_city_override(value);
                true
            }
        }
    }

    pub fn set_city_override(&mut self, text: &str) {
        let before = self.city_value().map(str::to_owned);
        self.cities.set_override_text(text);
        self.city_changed(before.as_deref());
    }

    fn city_changed(&mut self, before: Option<&str>) {
        if self.city_value() != before {
            self.invalidate_institutions();
        }
    }

    fn invalidate_institutions(&mut self) {
        for row in &mut self.rows {
            row.institution.reset();
        }
    }

    /// Selects the postal district if the freshly applied list offers it.
    fn take_pending_city(&mut self) {
        let Some(pending) = self.pending_city.take() else {
            return;
        };
        let offered = self
            .cities
            .candidates()
            .genuine()
            .find(|c| c.value.eq_ignore_ascii_case(&pending))
            .map(|c| c.value.clone());
        match offered {
            Some(city) => {
                tracing::info!(city = %city, "Selected city from postal lookup");
                self.select_city(&city);
            }
            None => tracing::debug!(city = %pending, "Postal district not in city list"),
        }
    }

    // ------------------------------------------------------------------
    // Academic rows and institutions
    // ------------------------------------------------------------------

    /// Appends a row and returns its index.
    pub fn add_row(&mut self, degree_level: DegreeLevel, degree_name: &str) -> usize {
        self.rows.push(AcademicRow::new(degree_level, degree_name));
        self.rows.len() - 1
    }

    /// Changes a row's degree. The row's institution is cleared if it differs.
    pub fn set_degree(&mut self, row: usize, degree_level: DegreeLevel, degree_name: &str) -> bool {
        let Some(r) = self.rows.get_mut(row) else {
            return false;
        };
        let degree_name = degree_name.trim();
        if r.degree_level != degree_level || r.degree_name != degree_name {
            r.degree_level = degree_level;
            r.degree_name = degree_name.to_string();
            r.institution.reset();
        }
        true
    }

    pub fn set_year(&mut self, row: usize, year: Option<i32>) -> bool {
        match self.rows.get_mut(row) {
            Some(r) => {
                r.year = year;
                true
            }
            None => false,
        }
    }

    pub fn select_institution(&mut self, row: usize, value: &str) -> bool {
        self.rows
            .get_mut(row)
            .is_some_and(|r| r.institution.select(value))
    }

    pub fn set_institution_override(&mut self, row: usize, text: &str) -> bool {
        match self.rows.get_mut(row) {
            Some(r) => {
                r.institution.set_override_text(text);
                true
            }
            None => false,
        }
    }

    /// Starts an institution load for `row`.
    ///
    /// Needs a resolved state; without one the row's institution goes back to
    /// its placeholder and `None` is returned.
    pub fn request_institutions(&mut self, row: usize) -> Option<LoadRequest<InstitutionQuery>> {
        let state = self.state_value().map(str::to_owned);
        let city = self.city_value().unwrap_or_default().to_string();
        let r = self.rows.get_mut(row)?;
        let Some(state) = state else {
            r.institution.reset();
            return None;
        };
        let query = InstitutionQuery::new(state, city, r.degree_level, &r.degree_name);
        Some(LoadRequest {
            target: Target::Institutions(row),
            token: r.institution.begin_load(),
            context: query,
        })
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Hands a finished load back to the level that issued it.
    pub fn apply(&mut self, update: LevelUpdate) -> Applied {
        match update.target {
            Target::States => {
                let before = self.state_value().map(str::to_owned);
                let applied = self.states.apply(update);
                self.state_changed(before.as_deref());
                applied
            }
            Target::Cities => {
                let before = self.city_value().map(str::to_owned);
                let applied = self.cities.apply(update);
                if applied == Applied::Applied {
                    self.take_pending_city();
                }
                self.city_changed(before.as_deref());
                applied
            }
            Target::Institutions(row) => match self.rows.get_mut(row) {
                Some(r) => r.institution.apply(update),
                None => Applied::Stale,
            },
        }
    }

    /// Selects the looked-up state and remembers the district for the city
    /// list that follows. Returns false if the lookup named no state.
    pub fn apply_postal(&mut self, location: &PostalLocation) -> bool {
        if !self.choose_state(&location.state) {
            return false;
        }
        let city = location.city.trim();
        self.pending_city = (!city.is_empty()).then(|| city.to_string());
        true
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Reconciles every level and collects the final strings.
    pub fn submission(&mut self) -> Submission {
        let city_state = reconcile_city_state(
            self.state_value(),
            self.cities.selected(),
            self.cities.override_text(),
        );

        let state = self.states.reconcile().into_value();
        let city = self.cities.reconcile().into_value();
        let records = self
            .rows
            .iter_mut()
            .map(|row| AcademicRecord {
                degree_level: row.degree_level,
                degree_name: (!row.degree_name.is_empty()).then(|| row.degree_name.clone()),
                year: row.year,
                institution: row.institution.reconcile().into_value(),
            })
            .collect();

        Submission {
            state,
            city,
            city_state,
            records,
        }
    }
}
