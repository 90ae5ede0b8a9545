//! Retries for directory requests.
//!
//! Every directory sits in a chain with something behind it, so a flaky one
//! gets a short second chance rather than a long wait. Only transient
//! failures are retried. A server that asks us to come back later than
//! [`RetryPolicy::max_wait`] is left alone and the chain moves on.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Wait before the first retry; doubled for each one after.
    pub base_delay: Duration,
    /// Longest pause between attempts, whether computed or asked for.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(200),
            max_wait: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Exponential backoff with up to 25% taken off, capped at `max_wait`.
    fn backoff(&self, retry: u32) -> Duration {
        let full = self
            .base_delay
            .saturating_mul(1 << retry.min(16))
            .min(self.max_wait);
        full.mul_f64(1.0 - rand::random::<f64>() * 0.25)
    }

    /// Pause before retrying a rejected request, or `None` when the server
    /// wants more time than we are willing to give.
    fn pause_for(&self, retry: u32, headers: &HeaderMap) -> Option<Duration> {
        match retry_after(headers) {
            Some(wait) if wait > self.max_wait => None,
            Some(wait) => Some(wait),
            None => Some(self.backoff(retry)),
        }
    }
}

/// `Retry-After` in delta seconds. HTTP dates are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(secs))
}

/// Statuses worth asking again: timeouts, throttling and server trouble.
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

#[derive(Debug)]
pub enum SendOutcome {
    /// A 2xx answer.
    Delivered(Response),
    /// The last non-2xx answer.
    Rejected(Response),
    /// No answer at all.
    Failed { attempts: u32, source: reqwest::Error },
}

/// Sends the request built by `build`, retrying transient failures.
pub async fn send_with_retry<F>(build: F, policy: &RetryPolicy) -> SendOutcome
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;

    loop {
        let may_retry = attempt < policy.max_retries;

        let pause = match build().send().await {
            Ok(response) if response.status().is_success() => {
                return SendOutcome::Delivered(response);
            }
            Ok(response) => {
                let status = response.status();
                if !may_retry || !is_transient(status) {
                    return SendOutcome::Rejected(response);
                }
                let Some(pause) = policy.pause_for(attempt, response.headers()) else {
                    tracing::debug!(%status, "Server asked for a longer wait than allowed");
                    return SendOutcome::Rejected(response);
                };
                tracing::debug!(%status, attempt = attempt + 1, pause_ms = pause.as_millis(), "Retrying directory request");
                pause
            }
            Err(e) => {
                if !may_retry || !(e.is_connect() || e.is_timeout()) {
                    return SendOutcome::Failed {
                        attempts: attempt + 1,
                        source: e,
                    };
                }
                let pause = policy.backoff(attempt);
                tracing::debug!(error = %e, attempt = attempt + 1, pause_ms = pause.as_millis(), "Retrying unreachable directory");
                pause
            }
        };

        tokio::time::sleep(pause).await;
        attempt += 1;
    }
}
