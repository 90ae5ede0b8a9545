//! Priority order between directories and response caching.

use enrol_core::ResolutionState;
use enrol_types::{DegreeLevel, Phase};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    config_for, mount_internal, mount_overpass, mount_states, mount_universities,
    mount_unknown_state, resolver_from, start,
};

#[tokio::test]
async fn broad_geocoder_search_follows_empty_city_search() {
    let (server, resolver) = start().await;
    mount_states(&server, &["Goa"]).await;
    mount_overpass(&server, "Ponda", &[]).await;
    mount_overpass(&server, "Goa", &["Goa University", "NIT Goa"]).await;
    mount_internal(
        &server,
        "cities",
        json!({ "cities": ["Ponda", "Panaji"] }),
    )
    .await;

    let mut form = ResolutionState::new();
    let _ = resolver.load_states(&mut form).await;
    assert!(form.select_state("Goa"));
    let _ = resolver.load_cities(&mut form).await;
    assert!(form.select_city("Ponda"));

    let row = form.add_row(DegreeLevel::Undergraduate, "");
    let _ = resolver.load_institutions(&mut form, row).await;
    let institution = form.row(row).unwrap().institution();
    assert_eq!(institution.phase(), Phase::Resolved);
    assert!(institution.candidates().contains("NIT Goa"));
}

#[tokio::test]
async fn internal_directory_answers_when_public_ones_do_not() {
    let (server, resolver) = start().await;
    mount_states(&server, &["Puducherry"]).await;
    mount_unknown_state(&server, "Puducherry").await;
    mount_internal(
        &server,
        "cities",
        json!({ "cities": ["Puducherry", "Karaikal"] }),
    )
    .await;
    mount_universities(&server, &[("Pondicherry University", Some("Tamil Nadu"))]).await;
    mount_internal(
        &server,
        "institutions",
        json!({ "institutions": ["Pondicherry Engineering College", "JIPMER"] }),
    )
    .await;

    let mut form = ResolutionState::new();
    let _ = resolver.load_states(&mut form).await;
    assert!(form.select_state("Puducherry"));
    let _ = resolver.load_cities(&mut form).await;
    assert_eq!(form.cities().phase(), Phase::Resolved);
    assert!(form.select_city("Karaikal"));

    let row = form.add_row(DegreeLevel::Undergraduate, "");
    let _ = resolver.load_institutions(&mut form, row).await;
    let institution = form.row(row).unwrap().institution();
    assert_eq!(
        institution.candidates().values()[..2],
        ["JIPMER", "Pondicherry Engineering College"]
    );
}

#[tokio::test]
async fn university_directory_filters_by_province() {
    let (server, resolver) = start().await;
    mount_states(&server, &["Kerala"]).await;
    mount_universities(
        &server,
        &[
            ("University of Kerala", Some("Kerala")),
            ("Cochin University of Science and Technology", Some("Kerala")),
            ("Anna University", Some("Tamil Nadu")),
            ("Mahatma Gandhi University", None),
        ],
    )
    .await;

    let mut form = ResolutionState::new();
    let _ = resolver.load_states(&mut form).await;
    assert!(form.choose_state("Kerala"));
    let row = form.add_row(DegreeLevel::Postgraduate, "MBA");
    let _ = resolver.load_institutions(&mut form, row).await;

    let institution = form.row(row).unwrap().institution();
    assert_eq!(institution.candidates().genuine_len(), 2);
    assert!(!institution.candidates().contains("Anna University"));
}

#[tokio::test]
async fn degrees_and_years_prefer_the_internal_directory() {
    let (server, resolver) = start().await;
    mount_internal(&server, "degrees", json!({ "degrees": ["B.Arch", "B.Des"] })).await;
    mount_internal(&server, "years", json!({ "years": [2025, 2024, 2023] })).await;

    let degrees = resolver.load_degrees(DegreeLevel::Undergraduate).await;
    assert_eq!(degrees, vec!["B.Arch", "B.Des", "BCA"]);
    assert_eq!(resolver.load_years().await, vec![2025, 2024, 2023]);
}

#[tokio::test]
async fn cached_responses_skip_the_network() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/countries/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "data": { "states": [{ "name": "Assam" }, { "name": "Bihar" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).replace("enabled = false", "enabled = true");
    let resolver = resolver_from(&config);

    for _ in 0..3 {
        let mut form = ResolutionState::new();
        let _ = resolver.load_states(&mut form).await;
        assert_eq!(form.states().phase(), Phase::Resolved);
        assert!(form.states().candidates().contains("Bihar"));
    }
}
