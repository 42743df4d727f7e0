//! Report artifact persistence.
//!
//! Every run writes exactly one JSON artifact. Names carry a
//! millisecond timestamp and files are opened create-new, so a second
//! run can never overwrite an earlier run's evidence.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::summary::RunReport;

/// Where and how artifacts are named.
#[derive(Debug, Clone)]
pub struct ArtifactSpec {
    /// Output directory (created if missing)
    pub dir: PathBuf,
    /// Filename prefix
    pub prefix: String,
    /// Optional OS tag inserted after the prefix
    pub os_tag: Option<String>,
}

impl ArtifactSpec {
    /// Base filename (without collision suffix or extension).
    pub fn stem(&self, report: &RunReport) -> String {
        let ts = report.timestamp.format("%Y%m%d_%H%M%S_%3f");
        match &self.os_tag {
            Some(os) => format!("{}_{}_{}", self.prefix, os, ts),
            None => format!("{}_{}", self.prefix, ts),
        }
    }
}

/// Write the report, returning the artifact path.
pub fn persist(report: &RunReport, spec: &ArtifactSpec) -> io::Result<PathBuf> {
    fs::create_dir_all(&spec.dir)?;
    let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
    let stem = spec.stem(report);

    let mut attempt = 0u32;
    loop {
        let path = candidate(&spec.dir, &stem, attempt);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(json.as_bytes())?;
                file.write_all(b"\n")?;
                tracing::info!("Report written to {}", path.display());
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn candidate(dir: &Path, stem: &str, attempt: u32) -> PathBuf {
    if attempt == 0 {
        dir.join(format!("{}.json", stem))
    } else {
        dir.join(format!("{}-{}.json", stem, attempt))
    }
}
