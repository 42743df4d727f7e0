//! Host platform detection.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Operating system family for platform-specific paths and scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    MacOS,
    Linux,
    Windows,
}

impl OsFamily {
    /// Detect the current platform.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            OsFamily::MacOS
        } else if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else {
            OsFamily::Linux
        }
    }

    /// Startup scripts the project is expected to ship for this family.
    pub fn startup_scripts(&self) -> &'static [&'static str] {
        match self {
            OsFamily::Windows => &["start_backend_windows.bat", "start_mobile_windows.bat"],
            OsFamily::MacOS => &["start_backend_macos.sh", "start_mobile_macos.sh"],
            OsFamily::Linux => &["start_backend.sh", "start_mobile.sh"],
        }
    }

    /// Directory holding executables inside an isolated environment.
    pub fn env_bin_dir(&self, env_dir: &Path) -> PathBuf {
        match self {
            OsFamily::Windows => env_dir.join("Scripts"),
            OsFamily::MacOS | OsFamily::Linux => env_dir.join("bin"),
        }
    }

    /// Resolve `program` inside an isolated environment when it lives there.
    ///
    /// Falls back to the bare name so PATH lookup still applies.
    pub fn resolve_in_env(&self, env_dir: &Path, program: &str) -> String {
        let bin = self.env_bin_dir(env_dir);
        let mut candidates = vec![bin.join(program)];
        if *self == OsFamily::Windows {
            candidates.push(bin.join(format!("{}.exe", program)));
        }
        candidates
            .into_iter()
            .find(|c| c.is_file())
            .map(|c| c.to_string_lossy().to_string())
            .unwrap_or_else(|| program.to_string())
    }
}

/// Facts about the host captured once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Lowercase OS name (e.g. "linux", "macos", "windows")
    pub os: String,
    /// Lowercase architecture (e.g. "x86_64", "aarch64")
    pub arch: String,
    #[serde(skip)]
    family: Option<OsFamily>,
}

impl HostInfo {
    /// Detect the running host.
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            family: Some(OsFamily::current()),
        }
    }

    /// Build host info for an explicit platform.
    pub fn new(os: &str, arch: &str, family: OsFamily) -> Self {
        Self {
            os: os.to_lowercase(),
            arch: arch.to_lowercase(),
            family: Some(family),
        }
    }

    /// The OS family, defaulting to the compile-time platform.
    pub fn family(&self) -> OsFamily {
        self.family.unwrap_or_else(OsFamily::current)
    }

    /// One-line description used by the OS detection check.
    pub fn describe(&self) -> String {
        format!("Running on {} {}", self.os, self.arch)
    }
}
