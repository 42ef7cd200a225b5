//! Core domain types for Tally.
//!
//! Everything in this crate is a plain value type: no IO, no async, no
//! rendering. The evaluator, engine, and TUI crates all build on these.

pub mod digit;
pub mod display;
pub mod operator;

pub use digit::Digit;
pub use display::DisplayBuffer;
pub use operator::{Operator, OperatorParseError};
