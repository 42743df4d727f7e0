//! Moodcheck - a verification harness for the Moodscape stack.
//!
//! One invocation provisions the backend and client dependencies, boots
//! the backend under supervision, runs an ordered catalogue of stages
//! against its API, and writes a categorized JSON report. The backend is
//! always stopped, whether the run passes, fails a gating check or is
//! interrupted.
//!
//! # Modules
//!
//! - [`api`] - HTTP client for the backend under test
//! - [`cli`] - Command-line argument parsing
//! - [`config`] - Configuration loading and defaults
//! - [`error`] - Error types and result aliases
//! - [`pipeline`] - One run, from host probing to the written report
//! - [`report`] - Check results, summaries, rendering and persistence
//! - [`requirements`] - Host capability probing and dependency installation
//! - [`runner`] - Stage execution and run-scoped state
//! - [`service`] - Backend process supervision and health polling
//! - [`shell`] - External command execution and platform facts
//! - [`stages`] - The verification stages
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use moodcheck::report::{summarize, CheckResult};
//!
//! let results = vec![
//!     CheckResult::pass("Auth: Login", "Login successful"),
//!     CheckResult::fail("Auth: Refresh", "Status code: 500"),
//! ];
//! let report = summarize(&results, None);
//! assert_eq!(report.summary.total_tests, 2);
//! assert_eq!(report.exit_code(), 1);
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod requirements;
pub mod runner;
pub mod service;
pub mod shell;
pub mod stages;
pub mod ui;

pub use error::{HarnessError, Result};
