//! Complete form walks with every directory answering.

use enrol_core::{Applied, ResolutionState};
use enrol_types::{DegreeLevel, OVERRIDE_MARKER, Phase};

use crate::common::{
    mount_cities, mount_overpass, mount_pincode, mount_states, mount_unknown_state, start,
};

#[tokio::test]
async fn state_city_institution_walk() {
    let (server, resolver) = start().await;
    mount_states(&server, &["Karnataka", "Kerala", "Goa"]).await;
    mount_cities(&server, "Karnataka", &["Mysuru", "Bengaluru", "Hubballi"]).await;
    mount_overpass(
        &server,
        "Bengaluru",
        &[
            "RV College of Engineering",
            "Indian Institute of Science",
            "RV College of Engineering",
        ],
    )
    .await;

    let mut form = ResolutionState::new();
    assert_eq!(resolver.load_states(&mut form).await, Applied::Applied);
    assert_eq!(form.states().phase(), Phase::Resolved);
    assert_eq!(
        form.states().candidates().values(),
        vec!["Goa", "Karnataka", "Kerala", OVERRIDE_MARKER]
    );

    assert!(form.select_state("Karnataka"));
    assert_eq!(
        resolver.load_cities(&mut form).await,
        Some(Applied::Applied)
    );
    assert_eq!(form.cities().phase(), Phase::Resolved);
    // Source order is kept for cities.
    assert_eq!(
        form.cities().candidates().values(),
        vec!["Mysuru", "Bengaluru", "Hubballi", OVERRIDE_MARKER]
    );

    assert!(form.select_city("Bengaluru"));
    let row = form.add_row(DegreeLevel::Undergraduate, "B.Tech Computer Science");
    form.set_year(row, Some(2022));
    assert_eq!(
        resolver.load_institutions(&mut form, row).await,
        Some(Applied::Applied)
    );
    let institution = form.row(row).unwrap().institution();
    assert_eq!(
        institution.candidates().values(),
        vec![
            "Indian Institute of Science",
            "RV College of Engineering",
            OVERRIDE_MARKER
        ]
    );

    assert!(form.select_institution(row, "Indian Institute of Science"));
    let submission = form.submission();
    assert!(submission.is_complete());
    assert_eq!(submission.city_state, "Bengaluru, Karnataka");
    assert_eq!(
        submission.records[0].institution.as_deref(),
        Some("Indian Institute of Science")
    );
    assert_eq!(submission.records[0].year, Some(2022));
}

#[tokio::test]
async fn override_text_flows_into_submission() {
    let (server, resolver) = start().await;
    mount_states(&server, &["Lakshadweep", "Kerala"]).await;
    mount_unknown_state(&server, "Lakshadweep").await;

    let mut form = ResolutionState::new();
    let _ = resolver.load_states(&mut form).await;
    assert!(form.select_state("Lakshadweep"));
    let _ = resolver.load_cities(&mut form).await;

    // No directory and no embedded table knows the state.
    assert_eq!(form.cities().phase(), Phase::OverrideRequired);
    assert!(form.cities().override_visible());
    assert_eq!(form.cities().selected(), Some(OVERRIDE_MARKER));

    form.set_city_override("  Kavaratti ");
    let row = form.add_row(DegreeLevel::Postgraduate, "MBA");
    let _ = resolver.load_institutions(&mut form, row).await;
    assert_eq!(
        form.row(row).unwrap().institution().phase(),
        Phase::OverrideRequired
    );
    form.set_institution_override(row, "Government College Kavaratti");

    let submission = form.submission();
    assert_eq!(submission.state.as_deref(), Some("Lakshadweep"));
    assert_eq!(submission.city.as_deref(), Some("Kavaratti"));
    assert_eq!(submission.city_state, "Kavaratti, Lakshadweep");
    assert_eq!(
        submission.records[0].institution.as_deref(),
        Some("Government College Kavaratti")
    );
    let json = serde_json::to_string(&submission).unwrap();
    assert!(!json.contains(OVERRIDE_MARKER));
}

#[tokio::test]
async fn postal_code_prefills_state_and_city() {
    let (server, resolver) = start().await;
    mount_states(&server, &["Goa", "Kerala"]).await;
    mount_pincode(&server, "403001", "north goa", "Goa").await;
    mount_cities(&server, "Goa", &["Panaji", "North Goa", "South Goa"]).await;

    let mut form = ResolutionState::new();
    let _ = resolver.load_states(&mut form).await;
    let location = resolver
        .autofill_from_postal(&mut form, "403 001")
        .await
        .expect("postal lookup resolves");

    assert_eq!(location.state, "Goa");
    assert_eq!(form.states().selected(), Some("Goa"));
    // The district is matched against the loaded list regardless of case.
    assert_eq!(form.cities().selected(), Some("North Goa"));
    assert_eq!(form.pending_city(), None);
}

#[tokio::test]
async fn postal_state_missing_from_list_is_inserted() {
    let (server, resolver) = start().await;
    mount_states(&server, &["Kerala"]).await;
    mount_pincode(&server, "682001", "Ernakulam", "Lakshadweep").await;
    mount_unknown_state(&server, "Lakshadweep").await;

    let mut form = ResolutionState::new();
    let _ = resolver.load_states(&mut form).await;
    assert!(
        resolver
            .autofill_from_postal(&mut form, "682001")
            .await
            .is_some()
    );
    assert_eq!(form.states().selected(), Some("Lakshadweep"));
    assert!(form.states().candidates().contains("Lakshadweep"));
    // The district is not offered; the override waits for typed text.
    assert_eq!(form.cities().phase(), Phase::OverrideRequired);
    assert!(form.cities().override_visible());
    assert_eq!(form.city_value(), None);
    assert_eq!(form.pending_city(), None);
}
