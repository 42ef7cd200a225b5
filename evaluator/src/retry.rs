//! HTTP retry policy with exponential backoff.
//!
//! # Retry Policy
//!
//! - Max retries: 2 (3 total attempts)
//! - Initial delay: 500ms, doubling per retry, capped at 8 seconds
//! - Down-jitter up to 25% (multiplier in [0.75, 1.0])
//! - `Retry-After` / `Retry-After-Ms` from the server wins when present and
//!   under a minute
//!
//! # Retryable Conditions
//!
//! - HTTP 408, 429, 5xx
//! - Connection and timeout errors
//!
//! The same `Idempotency-Key` is sent on every attempt of one logical
//! request so a retried calculation cannot be double-applied server-side.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, header::HeaderMap};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting the initial request).
    pub max_retries: u32,
    /// Backoff delay before the first retry.
    pub initial_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
    /// Down-jitter factor (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

/// Parse `Retry-After` or `Retry-After-Ms` headers.
///
/// Returns `Some(duration)` only for valid values with `0 < duration < 60s`.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(val) = headers.get("retry-after-ms")
        && let Ok(s) = val.to_str()
        && let Ok(ms) = s.parse::<f64>()
    {
        let duration = Duration::from_secs_f64(ms / 1000.0);
        if duration > Duration::ZERO && duration < Duration::from_secs(60) {
            return Some(duration);
        }
    }

    if let Some(val) = headers.get("retry-after")
        && let Ok(s) = val.to_str()
        && let Ok(secs) = s.parse::<u64>()
    {
        let duration = Duration::from_secs(secs);
        if duration > Duration::ZERO && duration < Duration::from_secs(60) {
            return Some(duration);
        }
    }

    None
}

#[must_use]
pub fn should_retry(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500..=599)
}

/// Backoff delay for `backoff_step` (0 before the first retry). A server
/// hint from [`parse_retry_after`] overrides the computed backoff.
#[must_use]
pub fn retry_delay(
    backoff_step: u32,
    config: &RetryConfig,
    server_hint: Option<Duration>,
) -> Duration {
    if let Some(delay) = server_hint {
        return delay;
    }

    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
    let capped = base.min(config.max_delay.as_secs_f64());
    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

/// Outcome of a retried request.
///
/// A sum type so callers cannot accidentally treat an error response as
/// success.
#[derive(Debug)]
pub enum RetryOutcome {
    /// 2xx response.
    Success(Response),
    /// Non-2xx response, either non-retryable or after exhausting retries.
    /// The response is provided for error body inspection.
    HttpError(Response),
    /// Transport failure after exhausting retries.
    ConnectionError {
        attempts: u32,
        source: reqwest::Error,
    },
    /// Transport failure on the first attempt that cannot be retried.
    NonRetryable(reqwest::Error),
}

impl RetryOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}

fn idempotency_key() -> String {
    format!("tally-{}", Uuid::new_v4())
}

/// Send a request with automatic retries.
///
/// `build_request` is called for each attempt; every attempt carries the
/// same `Idempotency-Key` header.
pub async fn send_with_retry<F>(build_request: F, config: &RetryConfig) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    let key = idempotency_key();
    let mut attempt = 0u32;

    loop {
        let request = build_request().header("Idempotency-Key", &key);
        let is_last = attempt >= config.max_retries;

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return RetryOutcome::Success(response);
                }
                if is_last || !should_retry(status) {
                    return RetryOutcome::HttpError(response);
                }
                let delay = retry_delay(attempt, config, parse_retry_after(response.headers()));
                drop(response);
                tracing::debug!(
                    status = %status,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retrying request after error status"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if !is_retryable_error(&e) {
                    return if attempt == 0 {
                        RetryOutcome::NonRetryable(e)
                    } else {
                        RetryOutcome::ConnectionError {
                            attempts: attempt + 1,
                            source: e,
                        }
                    };
                }
                if is_last {
                    return RetryOutcome::ConnectionError {
                        attempts: attempt + 1,
                        source: e,
                    };
                }
                let delay = retry_delay(attempt, config, None);
                tracing::debug!(
                    error = %e,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retrying request after connection error"
                );
                tokio::time::sleep(delay).await;
            }
        }

        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{RetryConfig, parse_retry_after, retry_delay, should_retry};
    use reqwest::{StatusCode, header::HeaderMap, header::HeaderValue};
    use std::time::Duration;

    #[test]
    fn parse_retry_after_ms() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after-ms", HeaderValue::from_static("1500"));
        assert_eq!(
            parse_retry_after(&headers),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("5"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(5)));
    }

    #[test]
    fn parse_retry_after_out_of_range() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("120"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.clear();
        headers.insert("retry-after", HeaderValue::from_static("0"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn retryable_status_codes() {
        assert!(should_retry(StatusCode::REQUEST_TIMEOUT)); // 408
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS)); // 429
        assert!(should_retry(StatusCode::INTERNAL_SERVER_ERROR)); // 500
        assert!(should_retry(StatusCode::SERVICE_UNAVAILABLE)); // 503

        assert!(!should_retry(StatusCode::BAD_REQUEST)); // 400
        assert!(!should_retry(StatusCode::UNPROCESSABLE_ENTITY)); // 422
        assert!(!should_retry(StatusCode::NOT_FOUND)); // 404
    }

    #[test]
    fn delay_bounds_with_jitter() {
        let config = RetryConfig::default();

        // backoff_step=0: base 500ms, jitter in [0.75, 1.0]
        for _ in 0..100 {
            let delay = retry_delay(0, &config, None);
            assert!(delay >= Duration::from_millis(375));
            assert!(delay <= Duration::from_millis(500));
        }

        // backoff_step=1: base 1000ms
        for _ in 0..100 {
            let delay = retry_delay(1, &config, None);
            assert!(delay >= Duration::from_millis(750));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn server_hint_wins() {
        let config = RetryConfig::default();
        let delay = retry_delay(0, &config, Some(Duration::from_secs(3)));
        assert_eq!(delay, Duration::from_secs(3));
    }
}

#[cfg(test)]
mod integration_tests {
    use super::{RetryConfig, RetryOutcome, send_with_retry};
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Fast retry config for tests (no real delays).
    fn fast_retry_config() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            jitter_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/ping", server.uri());

        let outcome = send_with_retry(|| client.get(&url), &fast_retry_config()).await;

        match outcome {
            RetryOutcome::Success(response) => {
                assert_eq!(response.status(), StatusCode::OK);
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn retries_on_500_then_succeeds() {
        let server = MockServer::start().await;
        let attempt = AtomicU32::new(0);

        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(move |_: &wiremock::Request| {
                if attempt.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(2)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/ping", server.uri());

        let outcome = send_with_retry(|| client.get(&url), &fast_retry_config()).await;
        assert!(outcome.is_success(), "expected Success");
    }

    #[tokio::test]
    async fn exhausted_retries_return_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3) // initial + 2 retries
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/ping", server.uri());

        let outcome = send_with_retry(|| client.get(&url), &fast_retry_config()).await;

        match outcome {
            RetryOutcome::HttpError(response) => {
                assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_retryable_status_fails_immediately() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(422).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/ping", server.uri());

        let outcome = send_with_retry(|| client.get(&url), &fast_retry_config()).await;

        match outcome {
            RetryOutcome::HttpError(response) => {
                assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn idempotency_key_is_consistent_across_attempts() {
        let server = MockServer::start().await;
        let keys: std::sync::Arc<std::sync::Mutex<Vec<String>>> =
            std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let keys_clone = keys.clone();

        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(move |req: &wiremock::Request| {
                let key = req
                    .headers
                    .get("Idempotency-Key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                keys_clone.lock().unwrap().push(key);

                if keys_clone.lock().unwrap().len() < 3 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/ping", server.uri());

        let _ = send_with_retry(|| client.get(&url), &fast_retry_config()).await;

        let collected = keys.lock().unwrap();
        assert_eq!(collected.len(), 3);
        assert!(collected[0].starts_with("tally-"));
        assert_eq!(collected[0], collected[1]);
        assert_eq!(collected[1], collected[2]);
    }
}
