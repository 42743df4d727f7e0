//! Configuration file discovery and loading.
//!
//! A project carries at most one harness config. Lookup order:
//! 1. `.moodcheck/config.yml`
//! 2. `moodcheck.yml`
//!
//! With neither present the built-in defaults apply.

use crate::config::schema::HarnessConfig;
use crate::error::{HarnessError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Find the config file for the given project root, if any.
pub fn find_config(project_root: &Path) -> Option<PathBuf> {
    [
        project_root.join(".moodcheck").join("config.yml"),
        project_root.join("moodcheck.yml"),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

/// Load the harness config for a project, falling back to defaults.
pub fn load_config(project_root: &Path) -> Result<HarnessConfig> {
    match find_config(project_root) {
        Some(path) => load_config_file(&path),
        None => {
            tracing::debug!("No config file under {}, using defaults", project_root.display());
            Ok(HarnessConfig::default())
        }
    }
}

/// Parse a single config file.
pub fn load_config_file(path: &Path) -> Result<HarnessConfig> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(HarnessConfig::default());
    }
    let config = serde_yaml::from_str(&content).map_err(|e| HarnessError::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}
