//! In-process evaluator.
//!
//! Honors the same contract as the remote service so the rest of the system
//! cannot tell the backends apart. Selected via `backend = "local"` in the
//! config; also the workhorse of the engine's tests.

use tally_types::Operator;
use tracing::debug;

use crate::EvalError;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalEvaluator;

impl LocalEvaluator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub fn calculate(&self, operator: Operator, a: f64, b: f64) -> Result<f64, EvalError> {
        debug!(%operator, a, b, "evaluating locally");
        match operator {
            Operator::Add => Ok(a + b),
            Operator::Subtract => Ok(a - b),
            Operator::Multiply => Ok(a * b),
            Operator::Divide => {
                if b == 0.0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }
            Operator::Equals => Err(EvalError::InvalidOperator(operator)),
        }
    }
}
