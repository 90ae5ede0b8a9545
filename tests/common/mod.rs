//! Shared test utilities and fixtures
//!
//! One mock server stands in for every directory; each source lives under its
//! own path so a single base URL serves them all.

#![allow(dead_code)]

use enrol_config::EnrolConfig;
use enrol_core::Resolver;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Config pointing every source at `server`, retries and caching off.
pub fn config_for(server: &MockServer) -> String {
    let uri = server.uri();
    format!(
        r#"
[sources]
countries_base = "{uri}"
geocoder_base = "{uri}"
universities_url = "{uri}/search"
pincode_base = "{uri}"
internal_base = "{uri}"

[http]
max_retries = 0
timeout_secs = 5

[cache]
enabled = false
"#
    )
}

pub fn resolver_from(toml: &str) -> Resolver {
    let config = EnrolConfig::parse(toml).expect("test config parses");
    Resolver::from_config(&config).expect("sources build")
}

pub async fn start() -> (MockServer, Resolver) {
    let server = MockServer::start().await;
    let resolver = resolver_from(&config_for(&server));
    (server, resolver)
}

/// Matches an Overpass query whose area filter names `area`.
pub struct OverpassArea(pub &'static str);

impl Match for OverpassArea {
    fn matches(&self, request: &Request) -> bool {
        let needle = format!("area[\"name\"=\"{}\"]", self.0);
        request
            .url
            .query_pairs()
            .any(|(key, value)| key == "data" && value.contains(&needle))
    }
}

pub async fn mount_states(server: &MockServer, states: &[&str]) {
    let states: Vec<_> = states.iter().map(|name| json!({ "name": name })).collect();
    Mock::given(method("POST"))
        .and(path("/countries/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "msg": "states retrieved",
            "data": { "name": "India", "states": states }
        })))
        .mount(server)
        .await;
}

pub async fn mount_cities(server: &MockServer, state: &str, cities: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/countries/state/cities"))
        .and(body_partial_json(json!({ "state": state })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "msg": "cities retrieved",
            "data": cities
        })))
        .mount(server)
        .await;
}

pub async fn mount_unknown_state(server: &MockServer, state: &str) {
    Mock::given(method("POST"))
        .and(path("/countries/state/cities"))
        .and(body_partial_json(json!({ "state": state })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": true,
            "msg": "state not found",
            "data": []
        })))
        .mount(server)
        .await;
}

pub async fn mount_overpass(server: &MockServer, area: &'static str, names: &[&str]) {
    let elements: Vec<_> = names
        .iter()
        .map(|name| json!({ "type": "node", "tags": { "name": name, "amenity": "college" } }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .and(OverpassArea(area))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elements": elements })))
        .mount(server)
        .await;
}

pub async fn mount_universities(server: &MockServer, rows: &[(&str, Option<&str>)]) {
    let rows: Vec<_> = rows
        .iter()
        .map(|(name, province)| {
            json!({ "name": name, "country": "India", "state-province": province })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("country", "India"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

pub async fn mount_pincode(server: &MockServer, code: &str, district: &str, state: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/pincode/{code}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Message": "Number of pincode(s) found:1",
            "Status": "Success",
            "PostOffice": [{
                "Name": "Head Office",
                "District": district,
                "State": state,
                "Country": "India"
            }]
        }])))
        .mount(server)
        .await;
}

pub async fn mount_internal(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/{route}/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
