//! Tally CLI - binary entry point and terminal session management.
//!
//! # Event Loop
//!
//! A fixed frame cadence drives everything:
//!
//! 1. Wait for frame tick
//! 2. Drain the input queue (non-blocking via [`tally_tui::InputPump`])
//! 3. Apply evaluation outcomes (`app.process_eval_events()`)
//! 4. Render the frame
//!
//! The evaluator call itself runs as a spawned task; the loop never blocks
//! on the network.

use std::{
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tally_config::{Backend, EvaluatorSettings, TallyConfig, config_path};
use tally_engine::App;
use tally_evaluator::{
    Evaluator, local::LocalEvaluator, remote::RemoteEvaluator, retry::RetryConfig,
};
use tally_tui::{InputPump, Theme, draw, handle_events};

const FRAME_DURATION: Duration = Duration::from_millis(16);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // If we can't open a log file, prefer "no logs" over corrupting the TUI
    // by writing to stdout/stderr.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.tally/logs/tally.log
    if let Some(config_path) = config_path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("tally.log"));
    }

    // Fallback: ./.tally/logs/tally.log (useful in constrained environments)
    candidates.push(PathBuf::from(".tally").join("logs").join("tally.log"));

    candidates
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop.
///
/// On drop, raw mode and the alternate screen are restored, so the terminal
/// remains usable even after panics or early returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

fn build_evaluator(settings: &EvaluatorSettings) -> Result<Evaluator> {
    match settings.backend {
        Backend::Local => Ok(Evaluator::Local(LocalEvaluator::new())),
        Backend::Remote => {
            let retry = RetryConfig {
                max_retries: settings.max_retries,
                ..RetryConfig::default()
            };
            let remote = RemoteEvaluator::new(&settings.url, settings.timeout, retry)
                .context("failed to build evaluator HTTP client")?;
            Ok(Evaluator::Remote(remote))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = match TallyConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %e.path().display(), error = %e, "ignoring unreadable config");
            None
        }
    };

    let settings = EvaluatorSettings::resolve(config.as_ref());
    tracing::info!(
        backend = settings.backend.as_str(),
        url = %settings.url,
        "evaluator selected"
    );

    let evaluator = build_evaluator(&settings)?;
    let mut app = App::new(evaluator);

    let high_contrast = config
        .as_ref()
        .and_then(|c| c.app.as_ref())
        .is_some_and(|app| app.high_contrast);
    let theme = Theme::new(high_contrast);

    let result = {
        let mut session = TerminalSession::new()?;
        run_app(&mut session.terminal, &mut app, &theme).await
    };

    if let Err(err) = &result {
        eprintln!("Error: {err:?}");
    }
    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    theme: &Theme,
) -> Result<()> {
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        frames.tick().await;

        // Non-blocking input (drain queue only)
        let quit_now = match handle_events(app, &mut input) {
            Ok(q) => q,
            Err(e) => break Err(e),
        };
        if quit_now {
            break Ok(());
        }

        app.process_eval_events();

        if let Err(e) = terminal.draw(|frame| draw(frame, app, theme)) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}
