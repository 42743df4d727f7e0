//! One verification run, end to end.
//!
//! Probe the host, install dependencies, launch the backend, run the
//! stage catalogue against it, then summarize and persist the report.
//! The backend is stopped on every path out of [`Pipeline::execute`];
//! a gating failure or an interrupt still produces a report.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::flag;

use crate::api::ApiClient;
use crate::config::{load_config, HarnessConfig};
use crate::error::{HarnessError, Result};
use crate::report::{
    persist, render, summarize, ArtifactSpec, CheckResult, ResultLog, RunReport, Thresholds,
};
use crate::requirements::{detect_host, probe_all, Installer};
use crate::runner::{RunProgress, Stage, StageEnv, StageRunner};
use crate::service::{
    HealthCheck, HttpHealthCheck, LaunchSpec, ReadinessPolicy, ServiceHandle, StartError,
};
use crate::shell::HostInfo;
use crate::stages::catalogue;
use crate::ui::UserInterface;

/// Name of the check recorded when a run is cut short.
const RUN_CHECK: &str = "Run";

/// What a finished run left behind.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub artifact: PathBuf,
    pub exit_code: u8,
    /// Times the supervisor had to terminate the backend
    pub service_terminations: u32,
}

/// Load the project's config, watch for SIGINT/SIGTERM and run.
pub fn run(project_root: &Path, ui: &mut dyn UserInterface) -> Result<RunOutcome> {
    let config = load_config(project_root)?;
    let pipeline = Pipeline::new(project_root, config);
    pipeline.watch_signals()?;
    pipeline.execute(ui)
}

/// A configured run over one project.
pub struct Pipeline {
    root: PathBuf,
    config: HarnessConfig,
    host: HostInfo,
    interrupt: Arc<AtomicBool>,
    stages: Option<Vec<Box<dyn Stage>>>,
}

impl Pipeline {
    pub fn new(project_root: &Path, config: HarnessConfig) -> Self {
        Self {
            root: project_root.to_path_buf(),
            config,
            host: HostInfo::detect(),
            interrupt: Arc::new(AtomicBool::new(false)),
            stages: None,
        }
    }

    /// Override the detected host.
    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = host;
        self
    }

    /// Replace the configured stage catalogue.
    pub fn with_stages(mut self, stages: Vec<Box<dyn Stage>>) -> Self {
        self.stages = Some(stages);
        self
    }

    /// The flag that cancels this run when raised.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Raise the interrupt flag on SIGINT or SIGTERM.
    pub fn watch_signals(&self) -> Result<()> {
        for signal in [SIGINT, SIGTERM] {
            flag::register(signal, Arc::clone(&self.interrupt))?;
        }
        Ok(())
    }

    /// Run every phase and write the report.
    ///
    /// Only a failure to write the artifact is returned as an error;
    /// everything else ends up in the report.
    pub fn execute(self, ui: &mut dyn UserInterface) -> Result<RunOutcome> {
        ui.show_header(&format!("{} Verification", self.config.app_name));

        let mut log = if self.config.report.tag_environment {
            ResultLog::tagged(self.host.clone())
        } else {
            ResultLog::new()
        };

        let mut terminations = 0;
        if let Err(e) = self.verify(ui, &mut log, &mut terminations) {
            let reason = match e {
                HarnessError::Interrupted => "interrupted".to_string(),
                other => other.to_string(),
            };
            tracing::warn!("Run aborted: {}", reason);
            let result = log.record(CheckResult::fail(RUN_CHECK, reason));
            echo(ui, result);
        }

        let report = summarize(log.entries(), Some(&self.host));
        let spec = ArtifactSpec {
            dir: self.root.join(&self.config.report.dir),
            prefix: self.config.report.prefix.clone(),
            os_tag: self
                .config
                .report
                .tag_environment
                .then(|| self.host.os.clone()),
        };
        let artifact = persist(&report, &spec)?;

        ui.show_header("Results");
        let thresholds = Thresholds::from(&self.config.report);
        let rendered = render(&report, &thresholds, ui.theme());
        ui.show_block(&rendered);
        ui.info(&format!("Report saved to {}", artifact.display()));
        if report.passed() {
            ui.success("All checks passed");
        } else {
            ui.error(&format!("{} check(s) failed", report.summary.failed_tests));
        }

        let exit_code = report.exit_code();
        Ok(RunOutcome {
            report,
            artifact,
            exit_code,
            service_terminations: terminations,
        })
    }

    fn verify(
        &self,
        ui: &mut dyn UserInterface,
        log: &mut ResultLog,
        terminations: &mut u32,
    ) -> Result<()> {
        ui.show_header("Environment");
        let mark = log.len();
        detect_host(&self.host, log);
        let probed = probe_all(&self.config.requirements, log);
        echo_all(ui, log.since(mark));
        probed?;
        self.check_interrupt()?;

        ui.show_header("Dependencies");
        let mark = log.len();
        let installed = self.install(log);
        echo_all(ui, log.since(mark));
        installed?;
        self.check_interrupt()?;

        ui.show_header("Backend");
        let health = HttpHealthCheck::new(
            &self.config.base_url,
            &self.config.backend.health_path,
            self.config.timeouts.request(),
        )
        .context("Failed to build the health check client")?;
        let policy = ReadinessPolicy::from(&self.config.timeouts);

        let mut service = ServiceHandle::new(self.launch_spec());
        let outcome = match service.start(&health, &policy, &self.interrupt) {
            Ok(()) => {
                ui.success(&format!("Backend healthy at {}", health.describe()));
                let started = backend_started(service.version());
                echo(ui, &started);
                log.record(started);
                self.run_stages(ui, log, &service)
            }
            Err(StartError::Interrupted) => Err(HarnessError::Interrupted),
            Err(e) => Err(e.into()),
        };

        service.stop();
        *terminations = service.terminations();
        outcome
    }

    fn install(&self, log: &mut ResultLog) -> Result<()> {
        let installer = Installer::new(&self.root, self.host.family());
        if self.config.backend.install {
            installer.install_backend_deps(&self.config.backend, log)?;
        }
        if self.config.stages.client {
            installer.install_client_deps(&self.config.client, log)?;
        }
        Ok(())
    }

    fn launch_spec(&self) -> LaunchSpec {
        let backend = &self.config.backend;
        let dir = self.root.join(&backend.dir);
        let mut argv = backend.launch.clone();
        if let Some(program) = argv.first_mut() {
            *program = self
                .host
                .family()
                .resolve_in_env(&dir.join(&backend.env_dir), program);
        }
        LaunchSpec::new(argv, dir)
    }

    fn run_stages(
        &self,
        ui: &mut dyn UserInterface,
        log: &mut ResultLog,
        service: &ServiceHandle,
    ) -> Result<()> {
        let api = ApiClient::new(&self.config.base_url, self.config.timeouts.request())
            .context("Failed to build the API client")?;
        let env = StageEnv {
            api: &api,
            config: &self.config,
            project_root: &self.root,
            host: &self.host,
            service: Some(service),
        };

        let configured;
        let stages = match &self.stages {
            Some(stages) => stages,
            None => {
                configured = catalogue(&self.config);
                &configured
            }
        };

        let mut runner = StageRunner::new();
        let run = runner.run_with_progress(stages, &env, log, &self.interrupt, |event| {
            match event {
                RunProgress::StageStarting { name, index, total } => {
                    ui.message(&format!("[{}/{}] {}...", index + 1, total, name));
                }
                RunProgress::CheckRecorded { result } => echo(ui, result),
                RunProgress::StageSkipped { name, missing } => {
                    ui.warning(&format!("{} skipped: no {}", name, missing));
                }
            }
        })?;

        tracing::info!(
            executed = run.executed.len(),
            skipped = run.skipped.len(),
            failed = run.failed.len(),
            "Stages finished"
        );
        Ok(())
    }

    fn check_interrupt(&self) -> Result<()> {
        if self.interrupt.load(Ordering::SeqCst) {
            return Err(HarnessError::Interrupted);
        }
        Ok(())
    }
}

fn backend_started(version: Option<&str>) -> CheckResult {
    match version {
        Some(version) => CheckResult::pass(
            "Backend Server",
            format!("Server started successfully - Version {}", version),
        ),
        None => CheckResult::pass("Backend Server", "Server started successfully"),
    }
}

fn echo(ui: &mut dyn UserInterface, result: &CheckResult) {
    if result.success {
        ui.success(&result.line());
    } else {
        ui.error(&result.line());
    }
}

fn echo_all(ui: &mut dyn UserInterface, results: &[CheckResult]) {
    for result in results {
        echo(ui, result);
    }
}
