//! Session state machine and orchestration for Tally.
//!
//! Split in two layers:
//!
//! - [`Session`] - a pure value type with the digit/decimal/clear/operator
//!   transition rules; unit-testable without a terminal or a runtime
//! - [`App`] - owns a session plus the evaluator boundary: spawns the
//!   asynchronous calculation when one falls due and applies its outcome on
//!   the next frame

pub mod app;
pub mod session;

pub use app::App;
pub use session::{EvalCall, Session, SessionInput};
