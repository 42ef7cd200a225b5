//! Arithmetic operator symbols.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A binary operator as pressed on the keypad and as sent over the wire.
///
/// `Equals` is stored and transmitted like any other operator; whether a
/// given operator actually computes is the evaluator's decision, not the
/// caller's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "=")]
    Equals,
}

const OPERATOR_SYMBOLS: &[&str] = &["+", "-", "*", "/", "="];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid operator '{raw}'; expected one of: {expected:?}")]
pub struct OperatorParseError {
    raw: String,
    expected: &'static [&'static str],
}

impl OperatorParseError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Equals => "=",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
            Operator::Equals => '=',
        }
    }

    pub fn parse(s: &str) -> Result<Self, OperatorParseError> {
        match s.trim() {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            "=" => Ok(Operator::Equals),
            other => Err(OperatorParseError {
                raw: other.to_string(),
                expected: OPERATOR_SYMBOLS,
            }),
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            '=' => Some(Operator::Equals),
            _ => None,
        }
    }

    #[must_use]
    pub fn all() -> &'static [Operator] {
        &[
            Operator::Add,
            Operator::Subtract,
            Operator::Multiply,
            Operator::Divide,
            Operator::Equals,
        ]
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
