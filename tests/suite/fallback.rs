//! Behaviour when directories are down or unconfigured.

use enrol_core::{Applied, ResolutionState};
use enrol_types::{DegreeLevel, OVERRIDE_MARKER, Phase};
use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

use crate::common::{config_for, mount_pincode, mount_states, resolver_from, start};

const OFFLINE: &str = r#"
[sources]
countries_base = ""
geocoder_base = ""
universities_url = ""
pincode_base = ""
internal_base = ""
"#;

#[tokio::test]
async fn outage_keeps_embedded_states_and_cities() {
    let (server, resolver) = start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut form = ResolutionState::new();
    assert_eq!(resolver.load_states(&mut form).await, Applied::Applied);
    assert_eq!(form.states().phase(), Phase::Fallback);
    assert!(form.states().candidates().contains("Maharashtra"));
    assert!(!form.states().candidates().has_override());

    assert!(form.select_state("Maharashtra"));
    let _ = resolver.load_cities(&mut form).await;
    assert_eq!(form.cities().phase(), Phase::Fallback);
    assert_eq!(
        form.cities().candidates().values(),
        vec!["Mumbai", "Pune", "Nagpur", "Nashik", OVERRIDE_MARKER]
    );

    assert!(form.select_city("Pune"));
    let row = form.add_row(DegreeLevel::Undergraduate, "");
    let _ = resolver.load_institutions(&mut form, row).await;
    assert_eq!(
        form.row(row).unwrap().institution().phase(),
        Phase::OverrideRequired
    );
}

#[tokio::test]
async fn no_sources_configured() {
    let resolver = resolver_from(OFFLINE);
    assert!(resolver.sources().postal.is_none());

    let mut form = ResolutionState::new();
    let _ = resolver.load_states(&mut form).await;
    assert_eq!(form.states().phase(), Phase::Fallback);
    assert!(resolver.autofill_from_postal(&mut form, "110001").await.is_none());
    assert_eq!(form.states().selected(), None);

    let pg = resolver.load_degrees(DegreeLevel::Postgraduate).await;
    assert_eq!(pg, vec!["M.Tech Computer Science", "M.Tech Data Science", "MBA", "MCA"]);
    let ug = resolver.load_degrees(DegreeLevel::Undergraduate).await;
    assert_eq!(ug.last().map(String::as_str), Some("BCA"));

    let years = resolver.load_years().await;
    assert_eq!(years.last(), Some(&1980));
    assert!(years.windows(2).all(|w| w[0] == w[1] + 1));
}

#[tokio::test]
async fn local_catalog_serves_institutions_offline() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    std::io::Write::write_all(
        &mut file,
        b"Institute Name,State,District\n\
          Government Polytechnic Nagpur,Maharashtra,Nagpur\n\
          VNIT Nagpur,Maharashtra,Nagpur\n\
          COEP Technological University,Maharashtra,Pune\n",
    )
    .unwrap();
    let config = format!(
        "{OFFLINE}local_catalog = \"{}\"\n",
        file.path().display()
    );
    let resolver = resolver_from(&config);

    let mut form = ResolutionState::new();
    let _ = resolver.load_states(&mut form).await;
    assert!(form.select_state("Maharashtra"));
    let _ = resolver.load_cities(&mut form).await;
    assert!(form.select_city("Nagpur"));
    let row = form.add_row(DegreeLevel::Undergraduate, "");
    let _ = resolver.load_institutions(&mut form, row).await;

    let institution = form.row(row).unwrap().institution();
    assert_eq!(institution.phase(), Phase::Resolved);
    assert_eq!(
        institution.candidates().values(),
        vec!["Government Polytechnic Nagpur", "VNIT Nagpur", OVERRIDE_MARKER]
    );
}

#[tokio::test]
async fn failed_postal_lookup_leaves_form_alone() {
    let (server, resolver) = start().await;
    mount_pincode(&server, "400001", "Mumbai", "Maharashtra").await;

    let mut form = ResolutionState::new();
    let _ = resolver.load_states(&mut form).await;
    assert!(form.select_state("Gujarat"));

    // Unknown code: the mock server answers 404.
    assert!(resolver.autofill_from_postal(&mut form, "999999").await.is_none());
    // Malformed code: never sent.
    assert!(resolver.autofill_from_postal(&mut form, "04000").await.is_none());
    assert_eq!(form.states().selected(), Some("Gujarat"));
}

#[tokio::test]
async fn oversized_directory_answer_falls_back() {
    let server = wiremock::MockServer::start().await;
    mount_states(&server, &["Andaman and Nicobar Islands", "Arunachal Pradesh", "Assam"]).await;
    let config = config_for(&server).replace("timeout_secs = 5", "timeout_secs = 5\nmax_body_bytes = 64");
    let resolver = resolver_from(&config);

    let mut form = ResolutionState::new();
    assert_eq!(resolver.load_states(&mut form).await, Applied::Applied);
    assert_eq!(form.states().phase(), Phase::Fallback);
    assert!(form.states().candidates().contains("Maharashtra"));
}
