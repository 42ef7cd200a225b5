//! Input handling for the Tally TUI.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use tally_engine::{App, SessionInput};
use tally_types::{Digit, Operator};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 256; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Blocking terminal-event reader on its own thread, feeding a bounded
/// channel the frame loop drains without blocking.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(&stop2, &tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close the receiver first so the reader thread unblocks if it is
        // currently backpressured on a send.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if the caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: &AtomicBool, tx: &mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// What a key event means to the calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyAction {
    Session(SessionInput),
    Quit,
    Ignore,
}

fn map_key(key: &KeyEvent) -> KeyAction {
    if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
        return KeyAction::Ignore;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => KeyAction::Quit,
            _ => KeyAction::Ignore,
        };
    }

    match key.code {
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Esc => {
            KeyAction::Session(SessionInput::Clear)
        }
        KeyCode::Char('.') => KeyAction::Session(SessionInput::Decimal),
        KeyCode::Enter => KeyAction::Session(SessionInput::Operator(Operator::Equals)),
        KeyCode::Char(c) => {
            if let Some(digit) = Digit::from_char(c) {
                KeyAction::Session(SessionInput::Digit(digit))
            } else if let Some(operator) = Operator::from_char(c) {
                KeyAction::Session(SessionInput::Operator(operator))
            } else {
                KeyAction::Ignore
            }
        }
        _ => KeyAction::Ignore,
    }
}

/// Drain queued input (non-blocking) and apply it. Returns `true` when the
/// user asked to quit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    for _ in 0..MAX_EVENTS_PER_FRAME {
        match input.rx.try_recv() {
            Ok(InputMsg::Event(Event::Key(key))) => match map_key(&key) {
                KeyAction::Quit => {
                    tracing::debug!("quit requested");
                    return Ok(true);
                }
                KeyAction::Session(session_input) => app.handle_input(session_input),
                KeyAction::Ignore => {}
            },
            // Resize is handled by ratatui on the next draw.
            Ok(InputMsg::Event(_)) => {}
            Ok(InputMsg::Error(e)) => return Err(anyhow!("input error: {e}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input thread terminated"));
            }
        }
    }
    Ok(false)
}
