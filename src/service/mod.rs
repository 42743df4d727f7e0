//! Backend process lifecycle.
//!
//! - [`supervisor`] - spawn, readiness polling, guaranteed termination
//! - [`health`] - the liveness probe polled during startup
//! - [`output`] - draining and tailing the child's output streams

pub mod health;
pub mod output;
pub mod supervisor;

pub use health::{HealthCheck, HealthProbe, HttpHealthCheck};
pub use output::OutputTail;
pub use supervisor::{LaunchSpec, ReadinessPolicy, ServiceHandle, ServiceState, StartError};
