//! The reconciled payload that leaves the resolver.

use enrol_types::DegreeLevel;
use serde::Serialize;

/// Final strings for the form. No field ever holds the override marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub state: Option<String>,
    pub city: Option<String>,
    /// `"{city}, {state}"`, either half alone, or empty.
    pub city_state: String,
    pub records: Vec<AcademicRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcademicRecord {
    pub degree_level: DegreeLevel,
    pub degree_name: Option<String>,
    pub year: Option<i32>,
    pub institution: Option<String>,
}

impl Submission {
    /// True when the state, the city and every row's institution resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.is_some()
            && self.city.is_some()
            && self.records.iter().all(|r| r.institution.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_degree_level_as_code() {
        let submission = Submission {
            state: Some("Goa".into()),
            city: Some("Panaji".into()),
            city_state: "Panaji, Goa".into(),
            records: vec![AcademicRecord {
                degree_level: DegreeLevel::Postgraduate,
                degree_name: Some("MBA".into()),
                year: Some(2024),
                institution: Some("Goa University".into()),
            }],
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["records"][0]["degree_level"], "PG");
        assert_eq!(json["city_state"], "Panaji, Goa");
        assert!(submission.is_complete());
    }

    #[test]
    fn missing_institution_is_incomplete() {
        let submission = Submission {
            state: Some("Goa".into()),
            city: Some("Panaji".into()),
            city_state: "Panaji, Goa".into(),
            records: vec![AcademicRecord {
                degree_level: DegreeLevel::Undergraduate,
                degree_name: None,
                year: None,
                institution: None,
            }],
        };
        assert!(!submission.is_complete());
        assert!(!Submission::default().is_complete());
    }
}
