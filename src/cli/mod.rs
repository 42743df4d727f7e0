//! Command-line interface for moodcheck.
//!
//! The harness takes no behavioural flags; [`Cli`] exists for `--help`
//! and `--version`. Everything else comes from the project config.

pub mod args;

pub use args::Cli;
