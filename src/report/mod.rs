//! Result aggregation and reporting.
//!
//! - [`result`] - individual check outcomes and the append-only run log
//! - [`summary`] - totals and per-category statistics
//! - [`persist`] - timestamped JSON artifacts
//! - [`render`] - console summary with pass-rate tiers

pub mod persist;
pub mod render;
pub mod result;
pub mod summary;

pub use persist::{persist, ArtifactSpec};
pub use render::{render, Thresholds, Tier};
pub use result::{category_of, CheckResult, ResultLog, DEFAULT_CATEGORY};
pub use summary::{summarize, CategoryStats, RunReport, Summary};
