//! Environment probe for host capabilities.
//!
//! Each requirement lists one or more identity commands (`node --version`).
//! The first command that runs and exits zero satisfies the requirement;
//! a program that cannot be spawned, or that exits non-zero, falls through
//! to the next alternative. Probing is read-only apart from the optional
//! recovery install for non-required tools.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::RequirementConfig;
use crate::error::{HarnessError, Result};
use crate::report::{CheckResult, ResultLog};
use crate::shell::{display_command, execute, CommandOptions, HostInfo};

/// Outcome of probing a single requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Requirement display name
    pub name: String,
    /// Trimmed identity output of the command that succeeded
    pub identity: Option<String>,
    /// Semantic version parsed from the identity, if any
    pub version: Option<String>,
}

impl ProbeReport {
    /// Whether any alternative command succeeded.
    pub fn found(&self) -> bool {
        self.identity.is_some()
    }

    /// Name of the check this probe records.
    pub fn check_name(&self) -> String {
        format!("{} Check", self.name)
    }

    /// Convert into a check result.
    pub fn to_check(&self) -> CheckResult {
        match (&self.identity, &self.version) {
            (Some(_), Some(version)) => {
                CheckResult::pass(self.check_name(), format!("{} {}", self.name, version))
            }
            (Some(identity), None) => CheckResult::pass(self.check_name(), identity.clone()),
            (None, _) => CheckResult::fail(self.check_name(), format!("{} not found", self.name)),
        }
    }
}

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:[-+][0-9A-Za-z.]+)?)").unwrap());

/// Extract a dotted version from a tool's identity output.
pub fn parse_version(identity: &str) -> Option<String> {
    VERSION_REGEX
        .captures(identity)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Probe one requirement without recording anything.
pub fn probe(requirement: &RequirementConfig) -> ProbeReport {
    for argv in &requirement.commands {
        match execute(argv, &CommandOptions::captured(None)) {
            Ok(result) if result.success => {
                let stdout = result.stdout.trim();
                let identity = if stdout.is_empty() {
                    result.stderr.trim().to_string()
                } else {
                    stdout.to_string()
                };
                let version = parse_version(&identity);
                tracing::debug!(
                    "{} found via '{}': {}",
                    requirement.name,
                    display_command(argv),
                    identity
                );
                return ProbeReport {
                    name: requirement.name.clone(),
                    identity: Some(identity),
                    version,
                };
            }
            Ok(result) => {
                tracing::debug!(
                    "'{}' exited with {:?}",
                    display_command(argv),
                    result.exit_code
                );
            }
            Err(e) => {
                tracing::debug!("'{}' could not run: {}", display_command(argv), e);
            }
        }
    }

    ProbeReport {
        name: requirement.name.clone(),
        identity: None,
        version: None,
    }
}

/// Record the host description as the first check of a run.
pub fn detect_host(host: &HostInfo, log: &mut ResultLog) {
    log.record(CheckResult::pass("OS Detection", host.describe()));
}

/// Probe every requirement in order, recording one check per probe.
///
/// A missing required capability stops probing and returns
/// [`HarnessError::RequirementMissing`]. A missing optional capability
/// with a recovery command runs it once and records the re-probe.
pub fn probe_all(requirements: &[RequirementConfig], log: &mut ResultLog) -> Result<()> {
    for requirement in requirements {
        let report = probe(requirement);
        log.record(report.to_check());

        if report.found() {
            continue;
        }

        if requirement.required {
            return Err(HarnessError::RequirementMissing {
                requirement: requirement.name.clone(),
                message: format!("{} not found", requirement.name),
            });
        }

        if let Some(recover) = &requirement.recover {
            run_recovery(&requirement.name, recover);
            let retry = probe(requirement);
            log.record(retry.to_check());
        }
    }
    Ok(())
}

/// Run a recovery command, logging and returning why it failed.
fn run_recovery(name: &str, recover: &[String]) -> Option<String> {
    let command = display_command(recover);
    tracing::info!("Installing {} with '{}'", name, command);
    let problem = match execute(recover, &CommandOptions::captured(None)) {
        Ok(result) if result.success => return None,
        Ok(result) => match result.exit_code {
            Some(code) => format!(
                "'{}' exited with code {}: {}",
                command,
                code,
                result.diagnostics()
            ),
            None => format!(
                "'{}' was killed by a signal: {}",
                command,
                result.diagnostics()
            ),
        },
        Err(e) => format!("'{}' could not run: {}", command, e),
    };
    tracing::warn!("Recovery for {} failed: {}", name, problem);
    Some(problem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn requirement(name: &str, commands: Vec<Vec<String>>, required: bool) -> RequirementConfig {
        RequirementConfig {
            name: name.to_string(),
            commands,
            required,
            recover: None,
        }
    }

    #[test]
    fn parse_version_variants() {
        assert_eq!(parse_version("Python 3.11.4"), Some("3.11.4".to_string()));
        assert_eq!(parse_version("v20.10.0"), Some("20.10.0".to_string()));
        assert_eq!(parse_version("10.2"), Some("10.2".to_string()));
        assert_eq!(parse_version("1.0.0-beta.2"), Some("1.0.0-beta.2".to_string()));
        assert_eq!(parse_version("no version here"), None);
    }

    #[test]
    fn missing_program_is_not_found() {
        let req = requirement(
            "Ghost",
            vec![argv(&["moodcheck-definitely-not-a-real-binary", "--version"])],
            true,
        );
        let report = probe(&req);
        assert!(!report.found());
        let check = report.to_check();
        assert!(!check.success);
        assert_eq!(check.name, "Ghost Check");
        assert_eq!(check.message, "Ghost not found");
    }

    #[cfg(unix)]
    #[test]
    fn falls_through_to_second_alternative() {
        let req = requirement(
            "Python",
            vec![
                argv(&["moodcheck-definitely-not-a-real-binary"]),
                argv(&["sh", "-c", "echo 'Python 3.12.1'"]),
            ],
            true,
        );
        let report = probe(&req);
        assert_eq!(report.identity.as_deref(), Some("Python 3.12.1"));
        let check = report.to_check();
        assert!(check.success);
        assert_eq!(check.message, "Python 3.12.1");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_falls_through() {
        let req = requirement(
            "Tool",
            vec![argv(&["sh", "-c", "exit 3"]), argv(&["sh", "-c", "echo v1.4.0"])],
            true,
        );
        assert_eq!(probe(&req).version.as_deref(), Some("1.4.0"));
    }

    #[cfg(unix)]
    #[test]
    fn identity_falls_back_to_stderr() {
        let req = requirement(
            "Quiet",
            vec![argv(&["sh", "-c", "echo 'quiet 2.0' >&2"])],
            true,
        );
        let report = probe(&req);
        assert_eq!(report.identity.as_deref(), Some("quiet 2.0"));
    }

    #[cfg(unix)]
    #[test]
    fn identity_without_version_is_recorded_verbatim() {
        let req = requirement("Thing", vec![argv(&["sh", "-c", "echo present"])], true);
        let check = probe(&req).to_check();
        assert!(check.success);
        assert_eq!(check.message, "present");
    }

    #[test]
    fn missing_required_requirement_is_gating() {
        let mut log = ResultLog::new();
        let reqs = vec![
            requirement(
                "Node.js",
                vec![argv(&["moodcheck-definitely-not-a-real-binary"])],
                true,
            ),
            requirement(
                "npm",
                vec![argv(&["moodcheck-definitely-not-a-real-binary"])],
                true,
            ),
        ];

        let err = probe_all(&reqs, &mut log).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::RequirementMissing { ref requirement, .. } if requirement == "Node.js"
        ));
        assert_eq!(log.len(), 1);
        assert_eq!(log.failed(), 1);
    }

    #[test]
    fn missing_optional_requirement_is_recorded_and_skipped() {
        let mut log = ResultLog::new();
        let reqs = vec![requirement(
            "Expo CLI",
            vec![argv(&["moodcheck-definitely-not-a-real-binary"])],
            false,
        )];

        probe_all(&reqs, &mut log).unwrap();
        assert_eq!(log.len(), 1);
        assert!(!log.entries()[0].success);
    }

    #[cfg(unix)]
    #[test]
    fn recovery_runs_once_then_reprobes() {
        let temp = tempfile::TempDir::new().unwrap();
        let marker = temp.path().join("installed");
        let marker_str = marker.to_string_lossy().to_string();

        let mut req = requirement(
            "Expo CLI",
            vec![argv(&[
                "sh",
                "-c",
                &format!("test -f '{}' && echo 'expo 0.18.4'", marker_str),
            ])],
            false,
        );
        req.recover = Some(argv(&["sh", "-c", &format!("touch '{}'", marker_str)]));

        let mut log = ResultLog::new();
        probe_all(&[req], &mut log).unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].success);
        assert!(entries[1].success);
        assert_eq!(entries[1].message, "Expo CLI 0.18.4");
    }

    #[cfg(unix)]
    #[test]
    fn failed_recovery_reports_diagnostics_and_still_reprobes() {
        let mut req = requirement("Expo CLI", vec![argv(&["sh", "-c", "exit 1"])], false);
        req.recover = Some(argv(&[
            "sh",
            "-c",
            "echo 'EACCES: permission denied' >&2; exit 243",
        ]));

        let problem = run_recovery(&req.name, req.recover.as_deref().unwrap()).unwrap();
        assert!(problem.contains("exited with code 243"), "{}", problem);
        assert!(problem.ends_with("EACCES: permission denied"), "{}", problem);

        let mut log = ResultLog::new();
        probe_all(&[req], &mut log).unwrap();
        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].success);
        assert!(!entries[1].success);
    }

    #[cfg(unix)]
    #[test]
    fn successful_recovery_reports_nothing() {
        assert_eq!(run_recovery("Expo CLI", &argv(&["true"])), None);
    }

    #[test]
    fn detect_host_records_description() {
        let mut log = ResultLog::new();
        let host = HostInfo::new("linux", "x86_64", crate::shell::OsFamily::Linux);
        detect_host(&host, &mut log);
        assert_eq!(log.entries()[0].name, "OS Detection");
        assert_eq!(log.entries()[0].message, "Running on linux x86_64");
    }
}
