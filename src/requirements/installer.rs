//! Dependency installation for the backend and client.
//!
//! Both installers are idempotent: the backend's isolated environment
//! is only created when its directory is absent, and package managers
//! are expected to no-op when everything is already installed.
//!
//! Installation runs inside the component directory. The directory
//! change is scoped by [`WorkingDirGuard`], which restores the previous
//! working directory on every exit path.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{BackendConfig, ClientConfig};
use crate::report::{CheckResult, ResultLog};
use crate::shell::{display_command, execute, CommandOptions, CommandResult, OsFamily};

/// Errors from dependency installation.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The component directory could not be entered.
    #[error("Cannot enter {component} directory {}: {source}", .dir.display())]
    Directory {
        component: String,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The install command could not be started at all.
    #[error("Failed to run '{command}' for {component}: {source}")]
    Spawn {
        component: String,
        command: String,
        #[source]
        source: io::Error,
    },

    /// The install command ran and failed; `output` is its diagnostics verbatim.
    #[error("{component} install failed: '{command}' exited with {}\n{output}", exit_label(.code))]
    CommandFailed {
        component: String,
        command: String,
        code: Option<i32>,
        output: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// Scoped working-directory change.
///
/// Entering switches the process working directory; dropping the guard
/// switches back, whether the scope ends normally, by `?`, or by panic.
#[derive(Debug)]
pub struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    /// Change into `dir`, remembering the current directory.
    pub fn enter(dir: &Path) -> io::Result<Self> {
        let previous = env::current_dir()?;
        env::set_current_dir(dir)?;
        tracing::debug!("Entered {}", dir.display());
        Ok(Self { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            tracing::warn!(
                "Failed to restore working directory {}: {}",
                self.previous.display(),
                e
            );
        }
    }
}

/// Installs backend and client dependencies under a project root.
pub struct Installer<'a> {
    root: &'a Path,
    family: OsFamily,
}

impl<'a> Installer<'a> {
    pub fn new(root: &'a Path, family: OsFamily) -> Self {
        Self { root, family }
    }

    /// Provision the backend's isolated environment and packages.
    ///
    /// Records `Virtual Environment`, `Backend Dependencies`, and, when a
    /// verify command is configured, `Python Import Test`. Only the
    /// environment creation and package install are gating.
    pub fn install_backend_deps(
        &self,
        backend: &BackendConfig,
        log: &mut ResultLog,
    ) -> Result<(), InstallError> {
        const COMPONENT: &str = "Backend";

        let dir = self.root.join(&backend.dir);
        let _guard = enter(COMPONENT, &dir)?;

        if backend.env_dir.is_dir() {
            log.record(CheckResult::pass("Virtual Environment", "Already exists"));
        } else {
            let argv = vec![
                backend.interpreter.clone(),
                "-m".to_string(),
                "venv".to_string(),
                backend.env_dir.to_string_lossy().to_string(),
            ];
            let result = run(COMPONENT, &argv).inspect_err(|e| {
                log.record(CheckResult::fail("Virtual Environment", format!("Error: {}", e)));
            })?;
            if !result.success {
                log.record(CheckResult::fail(
                    "Virtual Environment",
                    format!("Creation failed: {}", result.diagnostics()),
                ));
                return Err(failed(COMPONENT, &argv, &result));
            }
            log.record(CheckResult::pass("Virtual Environment", "Created successfully"));
        }

        let argv = vec![
            self.family
                .resolve_in_env(&backend.env_dir, &backend.package_manager),
            "install".to_string(),
            "-r".to_string(),
            backend.manifest.to_string_lossy().to_string(),
        ];
        let result = run(COMPONENT, &argv).inspect_err(|e| {
            log.record(CheckResult::fail("Backend Dependencies", format!("Error: {}", e)));
        })?;
        if !result.success {
            log.record(CheckResult::fail(
                "Backend Dependencies",
                format!("Installation failed: {}", result.diagnostics()),
            ));
            return Err(failed(COMPONENT, &argv, &result));
        }
        log.record(CheckResult::pass(
            "Backend Dependencies",
            "All dependencies installed",
        ));

        if let Some(verify) = &backend.verify {
            self.verify_backend(backend, verify, log);
        }

        Ok(())
    }

    fn verify_backend(&self, backend: &BackendConfig, verify: &[String], log: &mut ResultLog) {
        let Some((program, args)) = verify.split_first() else {
            return;
        };
        let mut argv = vec![self.family.resolve_in_env(&backend.env_dir, program)];
        argv.extend(args.iter().cloned());

        let check = match execute(&argv, &CommandOptions::captured(None)) {
            Ok(result) if result.success => {
                CheckResult::pass("Python Import Test", "Imports resolved")
            }
            Ok(result) => CheckResult::fail(
                "Python Import Test",
                format!("Import failed: {}", result.diagnostics()),
            ),
            Err(e) => CheckResult::fail("Python Import Test", format!("Error: {}", e)),
        };
        log.record(check);
    }

    /// Install client dependencies; a no-op when no install command is set.
    pub fn install_client_deps(
        &self,
        client: &ClientConfig,
        log: &mut ResultLog,
    ) -> Result<(), InstallError> {
        const COMPONENT: &str = "Mobile";

        let Some(argv) = &client.install else {
            tracing::debug!("No client install command configured");
            return Ok(());
        };

        let dir = self.root.join(&client.dir);
        let _guard = enter(COMPONENT, &dir)?;

        let result = run(COMPONENT, argv).inspect_err(|e| {
            log.record(CheckResult::fail("Mobile Dependencies", format!("Error: {}", e)));
        })?;
        if !result.success {
            log.record(CheckResult::fail(
                "Mobile Dependencies",
                format!("Installation failed: {}", result.diagnostics()),
            ));
            return Err(failed(COMPONENT, argv, &result));
        }
        log.record(CheckResult::pass(
            "Mobile Dependencies",
            "All dependencies installed",
        ));
        Ok(())
    }
}

fn enter(component: &str, dir: &Path) -> Result<WorkingDirGuard, InstallError> {
    WorkingDirGuard::enter(dir).map_err(|source| InstallError::Directory {
        component: component.to_string(),
        dir: dir.to_path_buf(),
        source,
    })
}

fn run(component: &str, argv: &[String]) -> Result<CommandResult, InstallError> {
    let command = display_command(argv);
    tracing::info!("{}: running '{}'", component, command);
    let result =
        execute(argv, &CommandOptions::captured(None)).map_err(|source| InstallError::Spawn {
            component: component.to_string(),
            command: command.clone(),
            source,
        })?;
    tracing::info!("{}: '{}' finished in {:.1?}", component, command, result.duration);
    Ok(result)
}

fn failed(component: &str, argv: &[String], result: &CommandResult) -> InstallError {
    InstallError::CommandFailed {
        component: component.to_string(),
        command: display_command(argv),
        code: result.exit_code,
        output: result.diagnostics().to_string(),
    }
}
