//! Rendering for the Tally TUI.
//!
//! One static frame: display field on top, keypad grid, status line. The
//! pending operator key is highlighted so the session state is visible
//! without reading logs.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    widgets::{Block, Paragraph},
};

use tally_engine::App;
use tally_types::{Operator, display::ERROR_TEXT};

use crate::theme::Theme;

const KEY_HEIGHT: u16 = 3;
const PANEL_WIDTH: u16 = 36;

/// One keypad cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(char),
    Decimal,
    Clear,
    Op(Operator),
}

impl Key {
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Key::Digit(c) => c.to_string(),
            Key::Decimal => ".".to_string(),
            Key::Clear => "C".to_string(),
            Key::Op(op) => op.as_str().to_string(),
        }
    }
}

/// The keypad grid, mirroring a desk calculator: digit block on the left,
/// operator column on the right, equals across the bottom.
pub const KEYPAD_ROWS: &[&[Key]] = &[
    &[
        Key::Digit('7'),
        Key::Digit('8'),
        Key::Digit('9'),
        Key::Op(Operator::Divide),
    ],
    &[
        Key::Digit('4'),
        Key::Digit('5'),
        Key::Digit('6'),
        Key::Op(Operator::Multiply),
    ],
    &[
        Key::Digit('1'),
        Key::Digit('2'),
        Key::Digit('3'),
        Key::Op(Operator::Subtract),
    ],
    &[
        Key::Digit('0'),
        Key::Decimal,
        Key::Clear,
        Key::Op(Operator::Add),
    ],
    &[Key::Op(Operator::Equals)],
];

pub fn draw(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = frame.area();
    frame.render_widget(Block::new().style(Style::default().bg(theme.bg)), area);

    let rows = u16::try_from(KEYPAD_ROWS.len()).unwrap_or(5);
    let panel_height = 3 + rows * KEY_HEIGHT + 1;
    let panel = centered(area, PANEL_WIDTH, panel_height);

    let mut constraints = vec![Constraint::Length(3)];
    constraints.extend(std::iter::repeat_n(
        Constraint::Length(KEY_HEIGHT),
        KEYPAD_ROWS.len(),
    ));
    constraints.push(Constraint::Length(1));
    let chunks = Layout::vertical(constraints).split(panel);

    render_display(frame, chunks[0], app, theme);
    for (i, row) in KEYPAD_ROWS.iter().enumerate() {
        render_key_row(frame, chunks[i + 1], row, app, theme);
    }
    render_status(frame, chunks[chunks.len() - 1], app, theme);
}

fn render_display(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let text = app.display_text();
    let style = theme.display_style(app.busy(), text == ERROR_TEXT);
    let display = Paragraph::new(text)
        .alignment(Alignment::Right)
        .style(style)
        .block(
            Block::bordered().border_style(Style::default().fg(theme.border)),
        );
    frame.render_widget(display, area);
}

fn render_key_row(frame: &mut Frame, area: Rect, row: &[Key], app: &App, theme: &Theme) {
    let constraints =
        std::iter::repeat_n(Constraint::Ratio(1, row.len() as u32), row.len());
    let cells = Layout::horizontal(constraints).split(area);

    for (key, cell) in row.iter().zip(cells.iter()) {
        let highlighted = matches!(key, Key::Op(op) if app.session().pending_operator() == Some(*op));
        let widget = Paragraph::new(key.label())
            .alignment(Alignment::Center)
            .style(theme.key_style(highlighted))
            .block(
                Block::bordered().border_style(Style::default().fg(theme.border)),
            );
        frame.render_widget(widget, *cell);
    }
}

fn render_status(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let status = format!(
        "backend: {}   q quit | c clear | enter =",
        app.backend_name()
    );
    let widget = Paragraph::new(status)
        .alignment(Alignment::Center)
        .style(theme.status_style());
    frame.render_widget(widget, area);
}

/// Center a `width` x `height` box inside `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
