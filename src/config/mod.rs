//! Configuration loading and schema.
//!
//! # Modules
//!
//! - [`schema`] - Struct definitions mirroring the YAML file
//! - [`loader`] - File discovery and parsing

pub mod loader;
pub mod schema;

pub use loader::{find_config, load_config, load_config_file};
pub use schema::{
    Account, BackendConfig, ClientConfig, Credentials, HarnessConfig, ReportConfig,
    RequirementConfig, StageToggles, Timeouts,
};
