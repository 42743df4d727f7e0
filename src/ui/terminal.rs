//! Terminal UI.

use console::Term;
use std::io::Write;

use super::{HarnessTheme, UserInterface};

/// Terminal UI implementation writing to stdout.
pub struct TerminalUI {
    term: Term,
    theme: HarnessTheme,
}

impl TerminalUI {
    /// Create a new terminal UI, colored when stdout is a TTY.
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            theme: HarnessTheme::detect(),
        }
    }
}

impl Default for TerminalUI {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInterface for TerminalUI {
    fn message(&mut self, msg: &str) {
        writeln!(self.term, "{}", msg).ok();
    }

    fn success(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn info(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_info(msg)).ok();
    }

    fn show_header(&mut self, title: &str) {
        writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
    }

    fn show_block(&mut self, text: &str) {
        writeln!(self.term, "{}", text).ok();
    }

    fn theme(&self) -> &HarnessTheme {
        &self.theme
    }
}
