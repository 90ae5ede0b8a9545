//! Universities and colleges inside a named area, from the Overpass API.
//!
//! The area is looked up by name (`area["name"="Pune"]`), so the same client
//! serves both the city-scoped and the state-scoped source; [`AreaScope`]
//! picks which field of the query names the area.

use enrol_types::{InstitutionQuery, SourceError};
use serde::Deserialize;

use crate::http::{HttpFetcher, endpoint};
use crate::{Source, SourceFut};

const AMENITIES: &str = "university|college";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaScope {
    City,
    State,
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Deserialize)]
struct Element {
    #[serde(default)]
    tags: Option<Tags>,
}

#[derive(Deserialize)]
struct Tags {
    name: Option<String>,
    #[serde(rename = "name:en")]
    name_en: Option<String>,
}

/// Geocoded amenity search scoped to a city or a state.
#[derive(Debug, Clone)]
pub struct GeocodedInstitutions {
    fetcher: HttpFetcher,
    base: String,
    scope: AreaScope,
}

impl GeocodedInstitutions {
    pub fn new(fetcher: HttpFetcher, base: impl Into<String>, scope: AreaScope) -> Self {
        Self {
            fetcher,
            base: base.into(),
            scope,
        }
    }

    fn area<'q>(&self, query: &'q InstitutionQuery) -> &'q str {
        match self.scope {
            AreaScope::City => query.city.trim(),
            AreaScope::State => query.state.trim(),
        }
    }

    async fn fetch(&self, query: &InstitutionQuery) -> Result<Vec<String>, SourceError> {
        let area = self.area(query);
        if area.is_empty() {
            return Err(SourceError::Empty);
        }

        let mut url = endpoint(&self.base, "api/interpreter")?;
        url.query_pairs_mut().append_pair("data", &overpass_query(area));

        let response: OverpassResponse = self.fetcher.get_json(url).await?;
        let names: Vec<String> = response
            .elements
            .into_iter()
            .filter_map(|e| e.tags)
            .filter_map(|t| t.name_en.or(t.name))
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        if names.is_empty() {
            Err(SourceError::Empty)
        } else {
            Ok(names)
        }
    }
}

impl Source<InstitutionQuery> for GeocodedInstitutions {
    fn name(&self) -> &'static str {
        match self.scope {
            AreaScope::City => "geocoded-city",
            AreaScope::State => "geocoded-state",
        }
    }

    fn query<'a>(&'a self, ctx: &'a InstitutionQuery) -> SourceFut<'a, Vec<String>> {
        Box::pin(self.fetch(ctx))
    }
}

/// Overpass QL for named amenities inside the area called `area`.
fn overpass_query(area: &str) -> String {
    let area = escape_ql(area);
    format!(
        "[out:json][timeout:25];\
         area[\"name\"=\"{area}\"]->.a;\
         (node[\"amenity\"~\"{AMENITIES}\"](area.a);\
         way[\"amenity\"~\"{AMENITIES}\"](area.a);\
         relation[\"amenity\"~\"{AMENITIES}\"](area.a););\
         out tags;"
    )
}

fn escape_ql(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_fetcher;
    use enrol_types::DegreeLevel;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query(state: &str, city: &str) -> InstitutionQuery {
        InstitutionQuery::new(state, city, DegreeLevel::Undergraduate, "")
    }

    #[test]
    fn query_language_escapes_quotes() {
        let ql = overpass_query(r#"Odd "Town""#);
        assert!(ql.contains(r#"area["name"="Odd \"Town\""]"#));
        assert!(ql.starts_with("[out:json]"));
    }

    #[tokio::test]
    async fn city_scope_queries_city_area() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/interpreter"))
            .and(query_param("data", overpass_query("Pune")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "elements": [
                    {"type": "node", "tags": {"name": "College of Engineering Pune", "amenity": "college"}},
                    {"type": "way", "tags": {"name": "Savitribai Phule Pune University", "name:en": "SPPU"}},
                    {"type": "node", "tags": {"amenity": "college"}},
                    {"type": "node"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = GeocodedInstitutions::new(test_fetcher(), server.uri(), AreaScope::City);
        let names = source.query(&query("Maharashtra", "Pune")).await.unwrap();
        assert_eq!(names, vec!["College of Engineering Pune", "SPPU"]);
        assert_eq!(source.name(), "geocoded-city");
    }

    #[tokio::test]
    async fn state_scope_uses_state_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("data", overpass_query("Goa")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "elements": [{"tags": {"name": "Goa University"}}]
            })))
            .mount(&server)
            .await;

        let source = GeocodedInstitutions::new(test_fetcher(), server.uri(), AreaScope::State);
        let names = source.query(&query("Goa", "")).await.unwrap();
        assert_eq!(names, vec!["Goa University"]);
    }

    #[tokio::test]
    async fn missing_area_is_empty_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let source = GeocodedInstitutions::new(test_fetcher(), server.uri(), AreaScope::City);
        assert_eq!(
            source.query(&query("Goa", " ")).await,
            Err(SourceError::Empty)
        );
    }

    #[tokio::test]
    async fn no_named_elements_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": []})))
            .mount(&server)
            .await;

        let source = GeocodedInstitutions::new(test_fetcher(), server.uri(), AreaScope::City);
        assert_eq!(
            source.query(&query("Goa", "Panaji")).await,
            Err(SourceError::Empty)
        );
    }
}
