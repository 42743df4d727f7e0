//! Configuration schema definitions for the harness.
//!
//! This module contains all the struct definitions that map to
//! the YAML configuration file format. Every struct is
//! `#[serde(default)]`, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for `moodcheck.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Application name (for display purposes)
    pub app_name: String,

    /// Base URL the backend listens on once started
    pub base_url: String,

    /// Network and lifecycle timeouts
    pub timeouts: Timeouts,

    /// Backend service provisioning and launch
    pub backend: BackendConfig,

    /// Companion client application checks
    pub client: ClientConfig,

    /// Host toolchains probed before anything else runs
    pub requirements: Vec<RequirementConfig>,

    /// Accounts used by the authentication stages
    pub credentials: Credentials,

    /// Optional stage groups
    pub stages: StageToggles,

    /// Report artifact settings
    pub report: ReportConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            app_name: "Moodscape".to_string(),
            base_url: "http://localhost:8000".to_string(),
            timeouts: Timeouts::default(),
            backend: BackendConfig::default(),
            client: ClientConfig::default(),
            requirements: default_requirements(),
            credentials: Credentials::default(),
            stages: StageToggles::default(),
            report: ReportConfig::default(),
        }
    }
}

/// Timeouts, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Upper bound for every HTTP request against the backend
    pub request_ms: u64,

    /// Upper bound on total health polling after spawn
    pub startup_ms: u64,

    /// Fixed delay between health polls
    pub poll_interval_ms: u64,

    /// How long a terminated backend gets to exit before it is killed
    pub stop_grace_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_ms: 5_000,
            startup_ms: 30_000,
            poll_interval_ms: 500,
            stop_grace_ms: 5_000,
        }
    }
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn startup(&self) -> Duration {
        Duration::from_millis(self.startup_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// Backend provisioning and launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend directory, relative to the project root
    pub dir: PathBuf,

    /// Install dependencies before launching
    pub install: bool,

    /// Isolated environment directory inside `dir`; its presence marks
    /// the environment as already created
    pub env_dir: PathBuf,

    /// Interpreter used to create the isolated environment
    pub interpreter: String,

    /// Dependency manifest passed to the environment's package manager
    pub manifest: PathBuf,

    /// Package manager executable inside the environment's bin directory
    pub package_manager: String,

    /// Optional post-install verification run inside the environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify: Option<Vec<String>>,

    /// Launch argv; the program is resolved inside the environment first
    pub launch: Vec<String>,

    /// Liveness path polled after launch
    pub health_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("backend"),
            install: true,
            env_dir: PathBuf::from("venv"),
            interpreter: "python3".to_string(),
            manifest: PathBuf::from("requirements.txt"),
            package_manager: "pip".to_string(),
            verify: None,
            launch: vec!["python".to_string(), "app/main.py".to_string()],
            health_path: "/health".to_string(),
        }
    }
}

/// Companion client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client directory, relative to the project root
    pub dir: PathBuf,

    /// Dependency install argv run inside `dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<Vec<String>>,

    /// Source files that must exist, relative to `dir`
    pub required_files: Vec<String>,

    /// Compile/type-check argv run inside `dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile: Option<Vec<String>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("MoodscapeApp"),
            install: Some(argv(&["npm", "install"])),
            required_files: [
                "App.tsx",
                "package.json",
                "src/screens/HomeScreen.tsx",
                "src/screens/SettingsScreen.tsx",
                "src/screens/AdminPanelScreen.tsx",
                "src/screens/PreviewScreen.tsx",
                "src/services/apiService.ts",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            compile: Some(argv(&["npx", "tsc", "--noEmit"])),
        }
    }
}

/// A host capability to probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementConfig {
    /// Display name (e.g. "Node.js"); the check is named "<name> Check"
    pub name: String,

    /// Identity commands tried in order; the first that runs wins
    pub commands: Vec<Vec<String>>,

    /// Whether a missing capability aborts the run
    #[serde(default = "default_true")]
    pub required: bool,

    /// Install argv attempted once before re-probing an optional capability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recover: Option<Vec<String>>,
}

/// Test accounts. Nothing here is compiled in beyond a throwaway user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Regular account registered and logged in by the auth stages
    pub user: Account,

    /// Privileged account for the admin stages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<Account>,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            user: Account {
                email: "test@example.com".to_string(),
                password: "TestPassword123".to_string(),
                name: Some("Test User".to_string()),
            },
            admin: None,
        }
    }
}

/// Login credentials for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Toggles for the optional stage groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    /// Authenticated API stages (registration, login, mood entries, AI)
    pub api: bool,

    /// Account-less preview flow
    pub preview: bool,

    /// Admin login and admin endpoints
    pub admin: bool,

    /// Per-OS startup script presence
    pub startup_scripts: bool,

    /// Client file presence and compile checks
    pub client: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            api: true,
            preview: true,
            admin: false,
            startup_scripts: false,
            client: true,
        }
    }
}

/// Report artifact and rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory artifacts are written to, relative to the project root
    pub dir: PathBuf,

    /// Artifact filename prefix
    pub prefix: String,

    /// Category pass rate at or above which a category renders as healthy
    pub pass_threshold: f64,

    /// Category pass rate at or above which a category renders as a caution
    pub caution_threshold: f64,

    /// Tag every check with the host OS and architecture
    pub tag_environment: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            prefix: "test_report".to_string(),
            pass_threshold: 80.0,
            caution_threshold: 60.0,
            tag_environment: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn default_requirements() -> Vec<RequirementConfig> {
    vec![
        RequirementConfig {
            name: "Python".to_string(),
            commands: vec![
                argv(&["python3", "--version"]),
                argv(&["python", "--version"]),
            ],
            required: true,
            recover: None,
        },
        RequirementConfig {
            name: "Node.js".to_string(),
            commands: vec![argv(&["node", "--version"])],
            required: true,
            recover: None,
        },
        RequirementConfig {
            name: "npm".to_string(),
            commands: vec![argv(&["npm", "--version"])],
            required: true,
            recover: None,
        },
        RequirementConfig {
            name: "Expo CLI".to_string(),
            commands: vec![argv(&["expo", "--version"])],
            required: false,
            recover: Some(argv(&["npm", "install", "-g", "@expo/cli"])),
        },
    ]
}
