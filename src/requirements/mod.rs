//! Host requirements and dependency provisioning.
//!
//! # Modules
//!
//! - [`probe`] - Detects required runtimes and tools on the host
//! - [`installer`] - Idempotent backend and client dependency installation

pub mod installer;
pub mod probe;

pub use installer::{InstallError, Installer, WorkingDirGuard};
pub use probe::{detect_host, parse_version, probe, probe_all, ProbeReport};
