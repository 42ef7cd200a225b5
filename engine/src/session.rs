//! The calculator input state machine.
//!
//! A pure value type plus transition methods, decoupled from rendering and
//! from the evaluator. An operator press that makes a computation due does
//! not perform it; the due call is returned to the caller, who later feeds
//! the outcome back through [`Session::apply_success`] /
//! [`Session::apply_failure`].

use tally_types::{Digit, DisplayBuffer, Operator};

/// One user action against the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionInput {
    Digit(Digit),
    Decimal,
    Operator(Operator),
    Clear,
}

/// A computation that fell due at an operator press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalCall {
    pub operator: Operator,
    pub a: f64,
    pub b: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    display: DisplayBuffer,
    first_operand: Option<f64>,
    pending_operator: Option<Operator>,
    awaiting_second_operand: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            display: DisplayBuffer::new(),
            first_operand: None,
            pending_operator: None,
            awaiting_second_operand: false,
        }
    }

    #[must_use]
    pub fn display(&self) -> &str {
        self.display.as_str()
    }

    #[must_use]
    pub const fn first_operand(&self) -> Option<f64> {
        self.first_operand
    }

    #[must_use]
    pub const fn pending_operator(&self) -> Option<Operator> {
        self.pending_operator
    }

    #[must_use]
    pub const fn awaiting_second_operand(&self) -> bool {
        self.awaiting_second_operand
    }

    /// Apply one input. Returns the evaluation that fell due, if any.
    pub fn apply(&mut self, input: SessionInput) -> Option<EvalCall> {
        match input {
            SessionInput::Digit(digit) => {
                self.input_digit(digit);
                None
            }
            SessionInput::Decimal => {
                self.input_decimal();
                None
            }
            SessionInput::Clear => {
                self.clear();
                None
            }
            SessionInput::Operator(operator) => self.press_operator(operator),
        }
    }

    fn input_digit(&mut self, digit: Digit) {
        if self.awaiting_second_operand {
            self.display.replace_with_digit(digit);
            self.awaiting_second_operand = false;
        } else {
            self.display.push_digit(digit);
        }
    }

    fn input_decimal(&mut self) {
        if self.awaiting_second_operand {
            self.display.start_decimal();
            self.awaiting_second_operand = false;
        } else {
            self.display.push_decimal();
        }
    }

    /// Full reset; no value survives.
    fn clear(&mut self) {
        *self = Self::new();
    }

    /// The first operator press captures the left-hand side; a press with a
    /// pending operator makes a computation due. Either way the session ends
    /// up awaiting the next operand with `next_op` pending - including
    /// `=`, which is stored like any other operator.
    fn press_operator(&mut self, next_op: Operator) -> Option<EvalCall> {
        let due = match (self.display.value(), self.first_operand) {
            (Some(input_value), None) => {
                self.first_operand = Some(input_value);
                None
            }
            (Some(input_value), Some(first)) => {
                self.pending_operator.map(|operator| EvalCall {
                    operator,
                    a: first,
                    b: input_value,
                })
            }
            // Display is the error sentinel: nothing sane to compute with.
            (None, _) => {
                self.display.set_error();
                None
            }
        };

        self.awaiting_second_operand = true;
        self.pending_operator = Some(next_op);
        due
    }

    /// A due computation succeeded: the result becomes both the display and
    /// the new left-hand side.
    pub fn apply_success(&mut self, result: f64) {
        self.display.set_result(result);
        self.first_operand = Some(result);
    }

    /// A due computation failed. The operands and pending operator are left
    /// untouched; only the display changes.
    pub fn apply_failure(&mut self) {
        self.display.set_error();
    }
}
