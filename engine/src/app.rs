//! Session orchestration around the asynchronous evaluator boundary.
//!
//! The frame loop feeds [`App::handle_input`] and drains
//! [`App::process_eval_events`] once per frame. A due computation is spawned
//! on the runtime; its outcome comes back over a bounded channel tagged with
//! the epoch it belongs to, so an outcome that raced a `clear` is dropped
//! instead of resurrecting pre-clear state.

use tokio::sync::mpsc;

use tally_evaluator::{EvalError, Evaluator};
use tally_types::display::CALCULATING_TEXT;

use crate::session::{EvalCall, Session, SessionInput};

const OUTCOME_CHANNEL_CAPACITY: usize = 16;

struct EvalOutcome {
    epoch: u64,
    result: Result<f64, EvalError>,
}

pub struct App {
    session: Session,
    evaluator: Evaluator,
    busy: bool,
    epoch: u64,
    outcome_tx: mpsc::Sender<EvalOutcome>,
    outcome_rx: mpsc::Receiver<EvalOutcome>,
}

impl App {
    #[must_use]
    pub fn new(evaluator: Evaluator) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);
        Self {
            session: Session::new(),
            evaluator,
            busy: false,
            epoch: 0,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Apply one user action.
    ///
    /// Busy-guard: while an evaluation is in flight, an operator press is
    /// rejected rather than racing the pending computation. Digits, the
    /// decimal point, and clear stay live; clear additionally wins over the
    /// in-flight call by advancing the epoch.
    pub fn handle_input(&mut self, input: SessionInput) {
        if self.busy {
            match input {
                SessionInput::Operator(operator) => {
                    tracing::debug!(%operator, "evaluation in flight; operator press rejected");
                    return;
                }
                SessionInput::Clear => {
                    self.epoch += 1;
                    self.busy = false;
                }
                SessionInput::Digit(_) | SessionInput::Decimal => {}
            }
        }

        if let Some(call) = self.session.apply(input) {
            self.spawn_evaluation(call);
        }
    }

    fn spawn_evaluation(&mut self, call: EvalCall) {
        self.busy = true;
        let evaluator = self.evaluator.clone();
        let tx = self.outcome_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = evaluator.calculate(call.operator, call.a, call.b).await;
            // A closed receiver means the app is gone; nothing to do.
            let _ = tx.send(EvalOutcome { epoch, result }).await;
        });
    }

    /// Drain evaluation outcomes. Called once per frame.
    pub fn process_eval_events(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if outcome.epoch != self.epoch {
                tracing::debug!("dropping stale evaluation outcome");
                continue;
            }
            self.busy = false;
            match outcome.result {
                Ok(value) => self.session.apply_success(value),
                Err(error) => {
                    tracing::warn!(%error, "evaluation failed");
                    self.session.apply_failure();
                }
            }
        }
    }

    /// What the display field should show this frame.
    #[must_use]
    pub fn display_text(&self) -> &str {
        if self.busy {
            CALCULATING_TEXT
        } else {
            self.session.display()
        }
    }

    #[must_use]
    pub const fn busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        self.evaluator.backend_name()
    }
}
