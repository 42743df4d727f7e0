//! Backend process supervision.
//!
//! A [`ServiceHandle`] owns the backend child process from spawn to exit.
//! Readiness is decided by polling a [`HealthCheck`] on a fixed interval
//! until a deadline. Every check is limited to the time left, so a
//! start never takes longer than `timeout + interval`. Termination is
//! idempotent: the
//! first `stop` (explicit, from `Drop`, or after a failed start) reaps
//! the child and every later call is a no-op.

use std::io;
use std::path::PathBuf;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use super::health::{HealthCheck, HealthProbe};
use super::output::{drain, OutputTail};
use crate::config::Timeouts;
use crate::shell::{build_command, display_command};

/// Lines of stderr kept for start diagnostics.
const STDERR_TAIL_LINES: usize = 40;

/// How often the grace period re-checks for exit.
const EXIT_POLL: Duration = Duration::from_millis(25);

/// How long to wait for output readers to flush after exit.
const READER_FLUSH: Duration = Duration::from_millis(500);

/// Lifecycle of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    NotStarted,
    Starting,
    Healthy,
    Stopped,
    FailedToStart,
}

impl ServiceState {
    /// `Stopped` and `FailedToStart` are never left.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceState::Stopped | ServiceState::FailedToStart)
    }
}

/// Errors from starting the backend.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("Failed to spawn backend '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Backend did not become healthy after {attempts} attempts{}", tail_suffix(.stderr_tail))]
    Timeout { attempts: u32, stderr_tail: String },

    #[error("Backend exited before becoming healthy ({}){}", exit_label(.code), tail_suffix(.stderr_tail))]
    Exited {
        code: Option<i32>,
        stderr_tail: String,
    },

    #[error("Interrupted while waiting for the backend")]
    Interrupted,

    #[error("Backend was already started")]
    AlreadyStarted,
}

fn tail_suffix(tail: &str) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!("\n--- backend stderr ---\n{}", tail)
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "killed by signal".to_string(),
    }
}

/// What to launch and where.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
}

impl LaunchSpec {
    pub fn new(argv: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            argv,
            cwd: cwd.into(),
        }
    }
}

/// Polling and shutdown timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Sleep between health attempts
    pub interval: Duration,
    /// Deadline for the service to become healthy
    pub timeout: Duration,
    /// Time allowed for a graceful exit before a forced kill
    pub stop_grace: Duration,
}

impl ReadinessPolicy {
    /// Most health attempts that fit the deadline: `ceil(timeout / interval)`,
    /// at least one.
    pub fn max_attempts(&self) -> u32 {
        let interval = self.interval.as_millis().max(1);
        let attempts = self.timeout.as_millis().div_ceil(interval);
        attempts.clamp(1, u32::MAX as u128) as u32
    }
}

impl From<&Timeouts> for ReadinessPolicy {
    fn from(timeouts: &Timeouts) -> Self {
        Self {
            interval: timeouts.poll_interval(),
            timeout: timeouts.startup(),
            stop_grace: timeouts.stop_grace(),
        }
    }
}

/// Handle to the supervised backend process.
#[derive(Debug)]
pub struct ServiceHandle {
    spec: LaunchSpec,
    state: ServiceState,
    child: Option<Child>,
    stderr_tail: OutputTail,
    readers: Vec<JoinHandle<()>>,
    stop_grace: Duration,
    terminations: u32,
    version: Option<String>,
}

impl ServiceHandle {
    /// Create a handle in [`ServiceState::NotStarted`].
    pub fn new(spec: LaunchSpec) -> Self {
        Self {
            spec,
            state: ServiceState::NotStarted,
            child: None,
            stderr_tail: OutputTail::new(STDERR_TAIL_LINES),
            readers: Vec::new(),
            stop_grace: Duration::from_secs(5),
            terminations: 0,
            version: None,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Whether a child is currently owned (not yet reaped).
    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// How many stop calls actually terminated or reaped the process.
    pub fn terminations(&self) -> u32 {
        self.terminations
    }

    /// Version reported by the health endpoint when it became healthy.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn stderr_tail(&self) -> String {
        self.stderr_tail.snapshot()
    }

    /// Spawn the process and poll `health` until it is ready.
    ///
    /// Connection failures and bad statuses while the process is alive are
    /// treated as "not ready yet". Polling ends at `policy.timeout` or after
    /// [`ReadinessPolicy::max_attempts`], whichever comes first; each check
    /// gets only the time left before the deadline. The process exiting,
    /// the interrupt flag, or the deadline passing all stop the child and
    /// leave the handle in [`ServiceState::FailedToStart`].
    pub fn start(
        &mut self,
        health: &dyn HealthCheck,
        policy: &ReadinessPolicy,
        interrupt: &AtomicBool,
    ) -> Result<(), StartError> {
        if self.state != ServiceState::NotStarted {
            return Err(StartError::AlreadyStarted);
        }
        self.stop_grace = policy.stop_grace;

        if let Err(e) = self.spawn() {
            self.state = ServiceState::FailedToStart;
            return Err(e);
        }
        self.state = ServiceState::Starting;

        let max_attempts = policy.max_attempts();
        let deadline = Instant::now() + policy.timeout;
        tracing::info!(
            "Waiting up to {:?} for {} (polling every {:?})",
            policy.timeout,
            health.describe(),
            policy.interval
        );

        let mut attempt = 0;
        loop {
            if interrupt.load(Ordering::SeqCst) {
                self.fail();
                return Err(StartError::Interrupted);
            }

            attempt += 1;
            let budget = deadline.saturating_duration_since(Instant::now());
            match health.check(budget) {
                HealthProbe::Healthy { version } => {
                    tracing::info!("Backend healthy after {} attempt(s)", attempt);
                    self.version = version;
                    self.state = ServiceState::Healthy;
                    return Ok(());
                }
                HealthProbe::Unavailable(reason) => {
                    tracing::debug!("Attempt {}: not ready ({})", attempt, reason);
                }
                HealthProbe::BadStatus(status) => {
                    tracing::debug!("Attempt {}: health returned {}", attempt, status);
                }
            }

            if let Some(status) = self.exited() {
                self.fail();
                return Err(StartError::Exited {
                    code: status.code(),
                    stderr_tail: self.stderr_tail(),
                });
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if attempt >= max_attempts || remaining.is_zero() {
                break;
            }
            thread::sleep(policy.interval.min(remaining));
        }

        self.fail();
        Err(StartError::Timeout {
            attempts: attempt,
            stderr_tail: self.stderr_tail(),
        })
    }

    fn spawn(&mut self) -> Result<(), StartError> {
        let command = display_command(&self.spec.argv);
        let spawn_error = |source| StartError::Spawn {
            command: command.clone(),
            source,
        };

        let mut cmd = build_command(&self.spec.argv).map_err(spawn_error)?;
        cmd.current_dir(&self.spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::info!("Spawning backend: {}", command);
        let mut child = cmd.spawn().map_err(spawn_error)?;
        tracing::debug!("Backend pid: {}", child.id());

        if let Some(stdout) = child.stdout.take() {
            self.readers.push(drain(stdout, "stdout", None));
        }
        if let Some(stderr) = child.stderr.take() {
            self.readers
                .push(drain(stderr, "stderr", Some(self.stderr_tail.clone())));
        }

        self.child = Some(child);
        Ok(())
    }

    fn exited(&mut self) -> Option<ExitStatus> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Failed to poll backend process: {}", e);
                None
            }
        }
    }

    fn fail(&mut self) {
        self.stop();
        self.state = ServiceState::FailedToStart;
    }

    /// Terminate the process: graceful signal, bounded wait, then kill.
    ///
    /// Never fails. Returns `true` only for the call that actually reaped
    /// the child; later calls return `false`.
    pub fn stop(&mut self) -> bool {
        let Some(mut child) = self.child.take() else {
            return false;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!("Backend already exited with {}", status);
            }
            _ => {
                tracing::info!("Stopping backend (pid: {})", child.id());
                terminate(&mut child, self.stop_grace);
            }
        }

        self.flush_readers();
        self.terminations += 1;
        if !self.state.is_terminal() {
            self.state = ServiceState::Stopped;
        }
        true
    }

    fn flush_readers(&mut self) {
        let deadline = Instant::now() + READER_FLUSH;
        while Instant::now() < deadline && self.readers.iter().any(|r| !r.is_finished()) {
            thread::sleep(EXIT_POLL);
        }
        // Readers still blocked belong to grandchildren holding the pipe.
        self.readers.clear();
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn terminate(child: &mut Child, grace: Duration) {
    if request_exit(child) {
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => thread::sleep(EXIT_POLL),
                Err(_) => break,
            }
        }
        tracing::warn!("Backend ignored termination request; killing");
    }

    if let Err(e) = child.kill() {
        tracing::debug!("Kill failed: {}", e);
    }
    if let Err(e) = child.wait() {
        tracing::warn!("Failed to reap backend: {}", e);
    }
}

#[cfg(unix)]
fn request_exit(child: &Child) -> bool {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return false;
    };
    // SAFETY: kill(2) has no memory-safety preconditions; the pid belongs
    // to a child we have not yet reaped.
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    struct Scripted {
        ready_after: Option<u32>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn never() -> Self {
            Self {
                ready_after: None,
                calls: AtomicU32::new(0),
            }
        }

        fn after(n: u32) -> Self {
            Self {
                ready_after: Some(n),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HealthCheck for Scripted {
        fn check(&self, _budget: Duration) -> HealthProbe {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.ready_after {
                Some(ready) if n >= ready => HealthProbe::Healthy {
                    version: Some("1.0.0".to_string()),
                },
                _ => HealthProbe::Unavailable("connection refused".to_string()),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    /// Answers only after a long stall, honoring the caller's budget.
    struct Stalling {
        stall: Duration,
        calls: AtomicU32,
        last_return: Mutex<Option<Instant>>,
    }

    impl Stalling {
        fn new(stall: Duration) -> Self {
            Self {
                stall,
                calls: AtomicU32::new(0),
                last_return: Mutex::new(None),
            }
        }
    }

    impl HealthCheck for Stalling {
        fn check(&self, budget: Duration) -> HealthProbe {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.stall.min(budget));
            *self.last_return.lock().unwrap() = Some(Instant::now());
            HealthProbe::Unavailable("operation timed out".to_string())
        }

        fn describe(&self) -> String {
            "stalling".to_string()
        }
    }

    fn started(
        spec: LaunchSpec,
        health: &dyn HealthCheck,
        policy: &ReadinessPolicy,
    ) -> ServiceHandle {
        let mut handle = ServiceHandle::new(spec);
        handle.start(health, policy, &AtomicBool::new(false)).unwrap();
        handle
    }

    fn policy(interval_ms: u64, timeout_ms: u64) -> ReadinessPolicy {
        ReadinessPolicy {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
            stop_grace: Duration::from_secs(2),
        }
    }

    #[test]
    fn max_attempts_rounds_up() {
        assert_eq!(policy(500, 30_000).max_attempts(), 60);
        assert_eq!(policy(20, 100).max_attempts(), 5);
        assert_eq!(policy(300, 1_000).max_attempts(), 4);
        assert_eq!(policy(500, 0).max_attempts(), 1);
    }

    #[test]
    fn policy_from_timeouts() {
        let timeouts = Timeouts::default();
        let policy = ReadinessPolicy::from(&timeouts);
        assert_eq!(policy.interval, timeouts.poll_interval());
        assert_eq!(policy.timeout, timeouts.startup());
    }

    #[test]
    fn terminal_states() {
        assert!(ServiceState::Stopped.is_terminal());
        assert!(ServiceState::FailedToStart.is_terminal());
        assert!(!ServiceState::Healthy.is_terminal());
    }

    #[test]
    fn spawn_failure_is_failed_to_start() {
        let spec = LaunchSpec::new(
            argv(&["moodcheck-definitely-not-a-real-binary"]),
            std::env::temp_dir(),
        );
        let mut handle = ServiceHandle::new(spec);
        let err = handle
            .start(&Scripted::never(), &policy(10, 50), &AtomicBool::new(false))
            .unwrap_err();

        assert!(matches!(err, StartError::Spawn { .. }));
        assert_eq!(handle.state(), ServiceState::FailedToStart);
        assert!(!handle.stop());
    }

    #[cfg(unix)]
    #[test]
    fn immediately_healthy_takes_one_attempt() {
        let spec = LaunchSpec::new(argv(&["sleep", "30"]), std::env::temp_dir());
        let health = Scripted::after(1);
        let began = Instant::now();

        let mut handle = started(spec, &health, &policy(200, 5_000));

        assert_eq!(handle.state(), ServiceState::Healthy);
        assert_eq!(health.calls(), 1);
        assert_eq!(handle.version(), Some("1.0.0"));
        assert!(began.elapsed() < Duration::from_millis(200));

        assert!(handle.stop());
        assert_eq!(handle.state(), ServiceState::Stopped);
    }

    #[cfg(unix)]
    #[test]
    fn never_healthy_stops_after_exactly_max_attempts() {
        let spec = LaunchSpec::new(argv(&["sleep", "30"]), std::env::temp_dir());
        let health = Scripted::never();
        let mut handle = ServiceHandle::new(spec);

        let err = handle
            .start(&health, &policy(20, 100), &AtomicBool::new(false))
            .unwrap_err();

        assert!(matches!(err, StartError::Timeout { attempts: 5, .. }));
        assert_eq!(health.calls(), 5);
        assert_eq!(handle.state(), ServiceState::FailedToStart);
        assert!(!handle.is_running());
        assert_eq!(handle.terminations(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn slow_checks_cannot_outlast_the_deadline() {
        let spec = LaunchSpec::new(argv(&["sleep", "30"]), std::env::temp_dir());
        let health = Stalling::new(Duration::from_millis(200));
        let policy = policy(20, 100);
        let mut handle = ServiceHandle::new(spec);

        let began = Instant::now();
        let err = handle
            .start(&health, &policy, &AtomicBool::new(false))
            .unwrap_err();

        assert!(matches!(err, StartError::Timeout { .. }));
        let polled = health.last_return.lock().unwrap().unwrap() - began;
        let bound = policy.timeout + policy.interval + Duration::from_millis(50);
        assert!(polled <= bound, "polling took {polled:?}, bound {bound:?}");
        assert!(health.calls.load(Ordering::SeqCst) < policy.max_attempts());
        assert_eq!(handle.state(), ServiceState::FailedToStart);
        assert_eq!(handle.terminations(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_reports_stderr_tail() {
        let spec = LaunchSpec::new(
            argv(&["sh", "-c", "echo 'ModuleNotFoundError: fastapi' >&2; exit 2"]),
            std::env::temp_dir(),
        );
        let mut handle = ServiceHandle::new(spec);

        let err = handle
            .start(&Scripted::never(), &policy(20, 5_000), &AtomicBool::new(false))
            .unwrap_err();

        match &err {
            StartError::Exited { code, stderr_tail } => {
                assert_eq!(*code, Some(2));
                assert!(stderr_tail.contains("ModuleNotFoundError"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("ModuleNotFoundError"));
        assert_eq!(handle.state(), ServiceState::FailedToStart);
    }

    #[cfg(unix)]
    #[test]
    fn interrupt_flag_aborts_start() {
        let spec = LaunchSpec::new(argv(&["sleep", "30"]), std::env::temp_dir());
        let mut handle = ServiceHandle::new(spec);

        let err = handle
            .start(&Scripted::never(), &policy(20, 5_000), &AtomicBool::new(true))
            .unwrap_err();

        assert!(matches!(err, StartError::Interrupted));
        assert!(!handle.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn stop_is_idempotent() {
        let spec = LaunchSpec::new(argv(&["sleep", "30"]), std::env::temp_dir());
        let mut handle = started(spec, &Scripted::after(1), &policy(20, 1_000));

        assert!(handle.stop());
        assert!(!handle.stop());
        assert!(!handle.stop());
        assert_eq!(handle.terminations(), 1);
        assert_eq!(handle.state(), ServiceState::Stopped);
    }

    #[cfg(unix)]
    #[test]
    fn drop_terminates_process() {
        let temp = tempfile::TempDir::new().unwrap();
        let marker = temp.path().join("exited");
        let script = format!(
            "trap 'touch \"{}\"; exit 0' TERM; while true; do sleep 0.05; done",
            marker.display()
        );
        let spec = LaunchSpec::new(argv(&["sh", "-c", &script]), temp.path());

        {
            let _handle = started(spec, &Scripted::after(1), &policy(20, 1_000));
        }

        assert!(marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn start_twice_is_rejected() {
        let spec = LaunchSpec::new(argv(&["sleep", "30"]), std::env::temp_dir());
        let mut handle = started(spec, &Scripted::after(1), &policy(20, 1_000));

        let err = handle
            .start(&Scripted::after(1), &policy(20, 1_000), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, StartError::AlreadyStarted));
        assert_eq!(handle.state(), ServiceState::Healthy);
    }
}
