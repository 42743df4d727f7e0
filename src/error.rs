//! Error types for harness runs.
//!
//! This module defines [`HarnessError`], the error type for everything that
//! is allowed to abort a run, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Only gating failures become a `HarnessError`: a missing required
//!   toolchain, a failed dependency install, a backend that never becomes
//!   healthy, an unreadable config, or an operator interrupt.
//! - Failed assertions and transport errors inside stages never surface
//!   here; they are recorded as failing checks and the run continues.
//! - Use `anyhow::Error` (via `HarnessError::Other`) for unexpected errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::requirements::installer::InstallError;
use crate::service::StartError;

/// Gating error that aborts the remainder of a run.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// A required runtime is not available on the host.
    #[error("Missing requirement '{requirement}': {message}")]
    RequirementMissing {
        requirement: String,
        message: String,
    },

    /// Dependency installation failed.
    #[error(transparent)]
    Install(#[from] InstallError),

    /// The backend never became healthy.
    #[error(transparent)]
    Start(#[from] StartError),

    /// A stage marked as gating recorded a failure.
    #[error("Gating stage '{stage}' failed")]
    GatingStage { stage: String },

    /// An operator interrupt arrived before the run completed.
    #[error("Run interrupted")]
    Interrupted,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parse_displays_path_and_message() {
        let err = HarnessError::ConfigParse {
            path: PathBuf::from("/project/moodcheck.yml"),
            message: "invalid type".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/project/moodcheck.yml"));
        assert!(msg.contains("invalid type"));
    }

    #[test]
    fn requirement_missing_displays_requirement_and_message() {
        let err = HarnessError::RequirementMissing {
            requirement: "Node.js".into(),
            message: "Node.js not found".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Node.js"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn install_error_is_transparent() {
        let err: HarnessError = InstallError::CommandFailed {
            component: "backend".into(),
            command: "pip install -r requirements.txt".into(),
            code: Some(1),
            output: "No matching distribution".into(),
        }
        .into();
        assert!(matches!(err, HarnessError::Install(_)));
        assert!(err.to_string().contains("No matching distribution"));
    }

    #[test]
    fn gating_stage_names_stage() {
        let err = HarnessError::GatingStage {
            stage: "Backend Health".into(),
        };
        assert_eq!(err.to_string(), "Gating stage 'Backend Health' failed");
    }

    #[test]
    fn interrupted_displays() {
        assert_eq!(HarnessError::Interrupted.to_string(), "Run interrupted");
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: HarnessError = io_err.into();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
