//! User-facing terminal output.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] writing styled lines to stdout
//! - [`MockUI`] capturing every line for assertions in tests
//!
//! Diagnostics go through `tracing`; this layer is only for the
//! check-by-check narrative a developer reads.

pub mod mock;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use terminal::TerminalUI;
pub use theme::{should_use_colors, HarnessTheme};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Display a plain message.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Display an informational message.
    fn info(&mut self, msg: &str);

    /// Show a section header.
    fn show_header(&mut self, title: &str);

    /// Write a pre-rendered block verbatim.
    fn show_block(&mut self, text: &str);

    /// The theme used for pre-rendered blocks.
    fn theme(&self) -> &HarnessTheme;
}

/// Create the terminal UI for the current environment.
pub fn create_ui() -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new())
}
