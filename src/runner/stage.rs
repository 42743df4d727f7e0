//! The stage abstraction.

use std::path::Path;

use crate::api::ApiClient;
use crate::config::HarnessConfig;
use crate::report::{CheckResult, ResultLog};
use crate::service::ServiceHandle;
use crate::shell::HostInfo;

use super::state::RunState;

/// One named unit of verification.
///
/// A stage declares the state keys it needs and the keys it may produce.
/// The runner never calls [`Stage::execute`] while a required key is
/// missing, and only merges produced keys that were declared.
pub trait Stage {
    fn name(&self) -> &str;

    /// State keys that must be present before the stage runs.
    fn requires(&self) -> &[&'static str] {
        &[]
    }

    /// State keys the stage is allowed to produce.
    fn produces(&self) -> &[&'static str] {
        &[]
    }

    /// Whether a failure in this stage aborts the rest of the run.
    fn gating(&self) -> bool {
        false
    }

    /// Perform the stage's checks.
    ///
    /// Failed assertions are recorded through the context. An `Err` means
    /// the stage itself broke and is recorded as one failing check.
    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()>;
}

/// Shared, read-only collaborators available to every stage.
pub struct StageEnv<'a> {
    pub api: &'a ApiClient,
    pub config: &'a HarnessConfig,
    pub project_root: &'a Path,
    pub host: &'a HostInfo,
    pub service: Option<&'a ServiceHandle>,
}

/// Per-stage view handed to [`Stage::execute`].
pub struct StageContext<'a> {
    env: &'a StageEnv<'a>,
    state: &'a RunState,
    log: &'a mut ResultLog,
    pending: Vec<(String, String)>,
}

impl<'a> StageContext<'a> {
    pub(crate) fn new(env: &'a StageEnv<'a>, state: &'a RunState, log: &'a mut ResultLog) -> Self {
        Self {
            env,
            state,
            log,
            pending: Vec::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        self.env.api
    }

    pub fn config(&self) -> &HarnessConfig {
        self.env.config
    }

    pub fn project_root(&self) -> &Path {
        self.env.project_root
    }

    pub fn host(&self) -> &HostInfo {
        self.env.host
    }

    pub fn service(&self) -> Option<&ServiceHandle> {
        self.env.service
    }

    /// Read a value produced by an earlier stage.
    pub fn state(&self, key: &str) -> Option<&str> {
        self.state.get(key)
    }

    /// Read a declared dependency.
    pub fn require(&self, key: &str) -> anyhow::Result<String> {
        self.state
            .get(key)
            .map(String::from)
            .ok_or_else(|| anyhow::anyhow!("missing dependency: {}", key))
    }

    /// Append a check to the run log.
    pub fn record(&mut self, result: CheckResult) {
        self.log.record(result);
    }

    pub fn pass(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.record(CheckResult::pass(name, message));
    }

    pub fn fail(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.record(CheckResult::fail(name, message));
    }

    /// Offer a state value; merged by the runner after the stage returns.
    pub fn provide(&mut self, key: &str, value: impl Into<String>) {
        self.pending.push((key.to_string(), value.into()));
    }

    pub(crate) fn into_pending(self) -> Vec<(String, String)> {
        self.pending
    }
}
