//! Remote evaluator client.
//!
//! Speaks JSON to an external arithmetic service:
//!
//! ```text
//! POST {base_url}/calculate
//! {"operator": "+", "a": 7.0, "b": 3.0}
//!
//! 200 -> {"result": 10.0}
//! 4xx/5xx -> {"error": {"code": "division_by_zero", "message": "..."}}
//! ```
//!
//! Known error codes are mapped onto the tagged [`EvalError`] variants;
//! anything else collapses to [`EvalError::Api`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_types::Operator;

use crate::{EvalError, http_client, read_capped_error_body, retry};

#[derive(Debug, Clone)]
pub struct RemoteEvaluator {
    client: reqwest::Client,
    endpoint: String,
    retry: retry::RetryConfig,
}

#[derive(Debug, Serialize)]
struct CalculateRequest {
    operator: Operator,
    a: f64,
    b: f64,
}

#[derive(Debug, Deserialize)]
struct CalculateResponse {
    result: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: String,
    #[serde(default)]
    message: String,
}

impl RemoteEvaluator {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retry: retry::RetryConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = http_client(timeout)?;
        let endpoint = format!("{}/calculate", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            retry,
        })
    }

    pub async fn calculate(&self, operator: Operator, a: f64, b: f64) -> Result<f64, EvalError> {
        let request = CalculateRequest { operator, a, b };
        tracing::debug!(%operator, a, b, endpoint = %self.endpoint, "dispatching calculation");

        let outcome = retry::send_with_retry(
            || self.client.post(&self.endpoint).json(&request),
            &self.retry,
        )
        .await;

        match outcome {
            retry::RetryOutcome::Success(response) => response
                .json::<CalculateResponse>()
                .await
                .map(|body| body.result)
                .map_err(|e| EvalError::InvalidResponse(e.to_string())),
            retry::RetryOutcome::HttpError(response) => {
                Err(decode_failure(operator, response).await)
            }
            retry::RetryOutcome::ConnectionError { attempts, source } => {
                Err(EvalError::Transport { attempts, source })
            }
            retry::RetryOutcome::NonRetryable(source) => Err(EvalError::Transport {
                attempts: 1,
                source,
            }),
        }
    }
}

async fn decode_failure(operator: Operator, response: reqwest::Response) -> EvalError {
    let status = response.status().as_u16();
    let body = read_capped_error_body(response).await;

    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => match parsed.error.code.as_str() {
            "division_by_zero" => EvalError::DivisionByZero,
            "invalid_operator" => EvalError::InvalidOperator(operator),
            _ => EvalError::Api {
                status,
                message: if parsed.error.message.is_empty() {
                    parsed.error.code
                } else {
                    parsed.error.message
                },
            },
        },
        Err(_) => EvalError::Api {
            status,
            message: body,
        },
    }
}
