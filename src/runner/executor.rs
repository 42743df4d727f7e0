//! Sequential stage execution.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::error::{HarnessError, Result};
use crate::report::{CheckResult, ResultLog};

use super::stage::{Stage, StageContext, StageEnv};
use super::state::RunState;

/// Progress events emitted while stages run.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A stage is about to start.
    StageStarting {
        name: &'a str,
        index: usize,
        total: usize,
    },
    /// A check was appended to the log.
    CheckRecorded { result: &'a CheckResult },
    /// A stage body was not run because a dependency was missing.
    StageSkipped { name: &'a str, missing: &'a str },
}

/// What happened to each stage.
#[derive(Debug, Default)]
pub struct StageRun {
    /// Stages whose body ran
    pub executed: Vec<String>,
    /// Stages skipped for a missing dependency
    pub skipped: Vec<String>,
    /// Stages that recorded at least one failure
    pub failed: Vec<String>,
}

/// Runs stages strictly in order, threading [`RunState`] between them.
#[derive(Debug, Default)]
pub struct StageRunner {
    state: RunState,
}

impl StageRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Run all stages.
    pub fn run(
        &mut self,
        stages: &[Box<dyn Stage>],
        env: &StageEnv<'_>,
        log: &mut ResultLog,
        interrupt: &AtomicBool,
    ) -> Result<StageRun> {
        self.run_with_progress(stages, env, log, interrupt, |_| {})
    }

    /// Run all stages, reporting progress.
    ///
    /// Returns early with [`HarnessError::Interrupted`] when the interrupt
    /// flag is raised between stages, and with
    /// [`HarnessError::GatingStage`] when a gating stage fails. Every
    /// check recorded up to that point stays in the log.
    pub fn run_with_progress(
        &mut self,
        stages: &[Box<dyn Stage>],
        env: &StageEnv<'_>,
        log: &mut ResultLog,
        interrupt: &AtomicBool,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<StageRun> {
        let mut run = StageRun::default();
        let total = stages.len();

        for (index, stage) in stages.iter().enumerate() {
            if interrupt.load(Ordering::SeqCst) {
                return Err(HarnessError::Interrupted);
            }

            let name = stage.name();
            on_progress(RunProgress::StageStarting { name, index, total });
            let first = log.len();

            if let Some(missing) = stage
                .requires()
                .iter()
                .copied()
                .find(|key| !self.state.contains(key))
            {
                tracing::debug!("Skipping '{}': missing {}", name, missing);
                log.record(CheckResult::fail(
                    name,
                    format!("missing dependency: {}", missing),
                ));
                run.skipped.push(name.to_string());
                on_progress(RunProgress::StageSkipped { name, missing });
            } else {
                self.execute(stage.as_ref(), env, log);
                run.executed.push(name.to_string());
            }

            let recorded = log.since(first);
            for result in recorded {
                on_progress(RunProgress::CheckRecorded { result });
            }

            if recorded.iter().any(|r| !r.success) {
                run.failed.push(name.to_string());
                if stage.gating() {
                    return Err(HarnessError::GatingStage {
                        stage: name.to_string(),
                    });
                }
            }
        }

        Ok(run)
    }

    fn execute(&mut self, stage: &dyn Stage, env: &StageEnv<'_>, log: &mut ResultLog) {
        let name = stage.name();
        let mut ctx = StageContext::new(env, &self.state, log);

        match stage.execute(&mut ctx) {
            Ok(()) => {
                let pending = ctx.into_pending();
                self.merge(stage, pending);
            }
            Err(e) => {
                drop(ctx);
                log.record(CheckResult::fail(name, format!("{:#}", e)));
            }
        }
    }

    fn merge(&mut self, stage: &dyn Stage, pending: Vec<(String, String)>) {
        for (key, value) in pending {
            if !stage.produces().iter().any(|declared| *declared == key) {
                warn!(
                    "Stage '{}' produced undeclared key '{}'; ignoring",
                    stage.name(),
                    key
                );
                continue;
            }
            if !self.state.insert_new(&key, value) {
                warn!(
                    "Stage '{}' tried to overwrite '{}'; keeping the existing value",
                    stage.name(),
                    key
                );
            }
        }
    }
}
