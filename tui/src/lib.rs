//! TUI rendering and input handling for Tally.

pub mod input;
pub mod theme;
pub mod view;

pub use input::{InputPump, handle_events};
pub use theme::Theme;
pub use view::draw;
