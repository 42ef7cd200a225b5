//! Evaluator clients for Tally.
//!
//! # Architecture
//!
//! The crate is organized around a backend dispatch pattern:
//!
//! - [`Evaluator`] - Unified entry point that dispatches to backend-specific
//!   implementations
//! - [`remote`] - HTTP JSON client for an external evaluator service
//! - [`local`] - In-process evaluator honoring the identical contract
//!
//! # Contract
//!
//! `calculate(operator, a, b) -> f64`:
//!
//! - `+`, `-`, `*` behave as standard floating-point arithmetic
//! - `/` fails with [`EvalError::DivisionByZero`] when `b == 0`
//! - any other operator value (including `=`) fails with
//!   [`EvalError::InvalidOperator`]
//! - no observable side effects beyond computing the result
//!
//! # Error Handling
//!
//! Failures are tagged ([`EvalError`]) so callers *can* distinguish
//! divide-by-zero from an invalid operator from a transport problem. The
//! calculator session deliberately collapses all of them to one display
//! string; the tags exist for logging and for future callers.

pub mod local;
pub mod remote;
pub mod retry;

use tally_types::Operator;

/// Default per-request timeout for the remote backend.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONNECT_TIMEOUT_SECS: u64 = 10;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Failure taxonomy of an evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("operator '{0}' is not computable")]
    InvalidOperator(Operator),
    #[error("evaluator returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed evaluator response: {0}")]
    InvalidResponse(String),
}

/// An evaluator backend. Callers go through [`Evaluator::calculate`] and
/// never match on the variant.
#[derive(Debug, Clone)]
pub enum Evaluator {
    Remote(remote::RemoteEvaluator),
    Local(local::LocalEvaluator),
}

impl Evaluator {
    /// Perform one binary operation.
    pub async fn calculate(&self, operator: Operator, a: f64, b: f64) -> Result<f64, EvalError> {
        match self {
            Evaluator::Remote(backend) => backend.calculate(operator, a, b).await,
            Evaluator::Local(backend) => backend.calculate(operator, a, b),
        }
    }

    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Evaluator::Remote(_) => "remote",
            Evaluator::Local(_) => "local",
        }
    }
}

/// Build the HTTP client used by the remote backend.
///
/// No redirects: the evaluator endpoint is a fixed URL, and a redirect would
/// silently re-send the request body elsewhere.
pub(crate) fn http_client(
    timeout: std::time::Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Read an error response body with a hard size cap.
pub(crate) async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
