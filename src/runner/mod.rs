//! Stage execution and run-state propagation.
//!
//! This module provides:
//! - [`Stage`] - a named unit of verification with declared state keys
//! - [`StageRunner`] - sequential execution with dependency gating
//! - [`RunState`] - write-once key/value state threaded between stages

pub mod executor;
pub mod stage;
pub mod state;

pub use executor::{RunProgress, StageRun, StageRunner};
pub use stage::{Stage, StageContext, StageEnv};
pub use state::{keys, RunState};
