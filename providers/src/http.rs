//! Shared HTTP plumbing: client construction and JSON fetches that map every
//! failure onto [`SourceError`].

use std::time::Duration;

use enrol_types::SourceError;
use reqwest::Response;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::retry::{RetryPolicy, SendOutcome, send_with_retry};

/// Directory payloads are small; anything bigger is not what we asked for.
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
    pub max_body_bytes: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
            user_agent: concat!("enrol/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// A client plus retry policy, cheap to clone and share between sources.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            client,
            retry: settings.retry.clone(),
            max_body_bytes: settings.max_body_bytes,
        })
    }

    #[must_use]
    pub fn from_client(client: reqwest::Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        let outcome = send_with_retry(|| self.client.get(url.clone()), &self.retry).await;
        self.decode(outcome, &url).await
    }

    pub async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, SourceError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let outcome =
            send_with_retry(|| self.client.post(url.clone()).json(body), &self.retry).await;
        self.decode(outcome, &url).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        outcome: SendOutcome,
        url: &Url,
    ) -> Result<T, SourceError> {
        let response = match outcome {
            SendOutcome::Delivered(response) => response,
            SendOutcome::Rejected(response) => {
                return Err(SourceError::Unavailable(format!(
                    "{} returned HTTP {}",
                    url.host_str().unwrap_or("host"),
                    response.status()
                )));
            }
            SendOutcome::Failed { attempts, source } => {
                return Err(SourceError::Unavailable(format!(
                    "no answer after {attempts} attempts: {source}"
                )));
            }
        };

        let body = read_capped(response, self.max_body_bytes).await?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

/// Buffers the body, refusing to hold more than `limit` bytes of it.
async fn read_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, SourceError> {
    if let Some(declared) = response.content_length()
        && declared > limit as u64
    {
        return Err(too_large(limit));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| SourceError::Unavailable(format!("failed to read body: {e}")))?
    {
        push_capped(&mut body, &chunk, limit)?;
    }
    Ok(body)
}

fn push_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), SourceError> {
    if body.len() + chunk.len() > limit {
        return Err(too_large(limit));
    }
    body.extend_from_slice(chunk);
    Ok(())
}

fn too_large(limit: usize) -> SourceError {
    SourceError::Malformed(format!("body exceeds {limit} bytes"))
}

/// Joins a configured base URL and a path.
///
/// An empty base means the source is disabled and reports itself unavailable.
pub fn endpoint(base: &str, path: &str) -> Result<Url, SourceError> {
    let base = base.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(SourceError::Unavailable("no base URL configured".to_string()));
    }
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{}", path.trim_start_matches('/'))
    };
    Url::parse(&joined).map_err(|e| SourceError::Unavailable(format!("invalid URL {joined}: {e}")))
}

/// Lowercases for case-insensitive containment checks.
pub(crate) fn norm(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
pub(crate) fn test_fetcher() -> HttpFetcher {
    HttpFetcher::from_client(
        reqwest::Client::new(),
        RetryPolicy::default().with_max_retries(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        cities: Vec<String>,
    }

    #[test]
    fn endpoint_joins_slashes() {
        let url = endpoint("https://portal.example.edu/", "/api/cities/").unwrap();
        assert_eq!(url.as_str(), "https://portal.example.edu/api/cities/");
    }

    #[test]
    fn endpoint_empty_base_is_unavailable() {
        assert!(matches!(
            endpoint("  ", "api"),
            Err(SourceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn get_json_decodes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cities/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"cities": ["Kochi"]})),
            )
            .mount(&server)
            .await;

        let url = endpoint(&server.uri(), "api/cities/").unwrap();
        let payload: Payload = test_fetcher().get_json(url).await.unwrap();
        assert_eq!(payload.cities, vec!["Kochi".to_string()]);
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let url = endpoint(&server.uri(), "x").unwrap();
        let result: Result<Payload, _> = test_fetcher().get_json(url).await;
        assert!(matches!(result, Err(SourceError::Malformed(_))));
    }

    #[tokio::test]
    async fn error_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = endpoint(&server.uri(), "x").unwrap();
        let result: Result<Payload, _> = test_fetcher().get_json(url).await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let server = MockServer::start().await;
        let cities: Vec<String> = (0..100).map(|n| format!("City {n}")).collect();
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "cities": cities })),
            )
            .mount(&server)
            .await;

        let url = endpoint(&server.uri(), "x").unwrap();
        let small = test_fetcher().with_max_body_bytes(256);
        let result: Result<Payload, _> = small.get_json(url.clone()).await;
        assert!(matches!(result, Err(SourceError::Malformed(m)) if m.contains("256")));

        let payload: Payload = test_fetcher().get_json(url).await.unwrap();
        assert_eq!(payload.cities.len(), 100);
    }

    #[test]
    fn chunks_stop_at_the_limit() {
        let mut body = Vec::new();
        push_capped(&mut body, b"[\"Goa\",", 12).unwrap();
        push_capped(&mut body, b"\"Ko", 12).unwrap();
        assert!(matches!(
            push_capped(&mut body, b"chi\"]", 12),
            Err(SourceError::Malformed(_))
        ));
        assert_eq!(body, b"[\"Goa\",\"Ko");
    }

    #[tokio::test]
    async fn post_json_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(body_json(serde_json::json!({"country": "India"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"cities": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = endpoint(&server.uri(), "echo").unwrap();
        let payload: Payload = test_fetcher()
            .post_json(url, &serde_json::json!({"country": "India"}))
            .await
            .unwrap();
        assert!(payload.cities.is_empty());
    }
}
