//! Check outcomes and the append-only result log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shell::HostInfo;

/// Category for checks whose name carries no delimiter.
pub const DEFAULT_CATEGORY: &str = "General";

/// Separates a check's category from the rest of its name.
pub const CATEGORY_DELIMITER: char = ':';

/// Outcome of a single verification step.
///
/// Immutable once recorded. Names need not be unique within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name, e.g. `User Login` or `File Check: App.tsx`
    #[serde(rename = "test")]
    pub name: String,

    /// Whether the check held
    pub success: bool,

    /// Free-text detail
    pub message: String,

    /// When the check was recorded
    pub timestamp: DateTime<Utc>,

    /// Category derived from the name
    pub category: String,

    /// Host OS tag (cross-platform runs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Host architecture tag (cross-platform runs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl CheckResult {
    /// Create a result stamped with the current time.
    pub fn new(name: impl Into<String>, success: bool, message: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            category: category_of(&name).to_string(),
            name,
            success,
            message: message.into(),
            timestamp: Utc::now(),
            os: None,
            arch: None,
        }
    }

    /// A passing check.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, true, message)
    }

    /// A failing check.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, false, message)
    }

    /// Attach host environment tags.
    pub fn with_host(mut self, host: &HostInfo) -> Self {
        self.os = Some(host.os.clone());
        self.arch = Some(host.arch.clone());
        self
    }

    /// One-line rendering, `name: message`.
    pub fn line(&self) -> String {
        format!("{}: {}", self.name, self.message)
    }
}

/// Derive a category from a check name.
///
/// The substring before the first delimiter, trimmed; names without a
/// delimiter (or with an empty prefix) fall into [`DEFAULT_CATEGORY`].
pub fn category_of(name: &str) -> &str {
    match name.split_once(CATEGORY_DELIMITER) {
        Some((prefix, _)) if !prefix.trim().is_empty() => prefix.trim(),
        _ => DEFAULT_CATEGORY,
    }
}

/// Ordered, append-only log of every check recorded during a run.
///
/// Insertion order is execution order; entries are never removed or
/// rewritten.
#[derive(Debug, Default)]
pub struct ResultLog {
    entries: Vec<CheckResult>,
    host_tags: Option<HostInfo>,
}

impl ResultLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that tags every entry with the given host.
    pub fn tagged(host: HostInfo) -> Self {
        Self {
            entries: Vec::new(),
            host_tags: Some(host),
        }
    }

    /// Append a result, returning the stored entry.
    pub fn record(&mut self, result: CheckResult) -> &CheckResult {
        let result = match &self.host_tags {
            Some(host) => result.with_host(host),
            None => result,
        };
        tracing::debug!(
            check = %result.name,
            success = result.success,
            "{}",
            result.message
        );
        self.entries.push(result);
        &self.entries[self.entries.len() - 1]
    }

    /// All entries in execution order.
    pub fn entries(&self) -> &[CheckResult] {
        &self.entries
    }

    /// Entries recorded at or after `index`.
    pub fn since(&self, index: usize) -> &[CheckResult] {
        self.entries.get(index..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of passing entries.
    pub fn passed(&self) -> usize {
        self.entries.iter().filter(|r| r.success).count()
    }

    /// Number of failing entries.
    pub fn failed(&self) -> usize {
        self.entries.len() - self.passed()
    }
}
