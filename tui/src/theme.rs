//! Color theme for the Tally TUI.
//!
//! Gruvbox-flavored palette by default with an optional high-contrast
//! override.

use ratatui::style::{Color, Modifier, Style};

mod colors {
    use super::Color;

    // === Backgrounds ===
    pub const BG: Color = Color::Rgb(29, 32, 33);
    pub const BG_PANEL: Color = Color::Rgb(40, 40, 40);
    pub const BG_KEY: Color = Color::Rgb(60, 56, 54);
    pub const BORDER: Color = Color::Rgb(102, 92, 84);

    // === Foregrounds ===
    pub const TEXT: Color = Color::Rgb(235, 219, 178);
    pub const TEXT_MUTED: Color = Color::Rgb(146, 131, 116);

    // === Accents ===
    pub const ACCENT: Color = Color::Rgb(131, 165, 152); // aqua
    pub const OPERATOR: Color = Color::Rgb(254, 128, 25); // orange
    pub const WARNING: Color = Color::Rgb(250, 189, 47); // yellow
    pub const ERROR: Color = Color::Rgb(251, 73, 52); // red
}

/// Resolved theme used by the views.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub bg: Color,
    pub bg_panel: Color,
    pub bg_key: Color,
    pub border: Color,
    pub text: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub operator: Color,
    pub warning: Color,
    pub error: Color,
}

impl Theme {
    #[must_use]
    pub const fn new(high_contrast: bool) -> Self {
        if high_contrast {
            Self {
                bg: Color::Black,
                bg_panel: Color::Black,
                bg_key: Color::Black,
                border: Color::White,
                text: Color::White,
                text_muted: Color::Gray,
                accent: Color::Cyan,
                operator: Color::Yellow,
                warning: Color::Yellow,
                error: Color::Red,
            }
        } else {
            Self {
                bg: colors::BG,
                bg_panel: colors::BG_PANEL,
                bg_key: colors::BG_KEY,
                border: colors::BORDER,
                text: colors::TEXT,
                text_muted: colors::TEXT_MUTED,
                accent: colors::ACCENT,
                operator: colors::OPERATOR,
                warning: colors::WARNING,
                error: colors::ERROR,
            }
        }
    }

    /// Style for the display line in its three states.
    #[must_use]
    pub fn display_style(&self, busy: bool, error: bool) -> Style {
        if busy {
            Style::default().fg(self.warning).bg(self.bg_panel)
        } else if error {
            Style::default()
                .fg(self.error)
                .bg(self.bg_panel)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(self.text)
                .bg(self.bg_panel)
                .add_modifier(Modifier::BOLD)
        }
    }

    #[must_use]
    pub fn key_style(&self, highlighted: bool) -> Style {
        if highlighted {
            Style::default()
                .fg(self.bg)
                .bg(self.operator)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.text).bg(self.bg_key)
        }
    }

    #[must_use]
    pub fn status_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(false)
    }
}
