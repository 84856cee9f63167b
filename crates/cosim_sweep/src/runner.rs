//! Timeout-bounded execution of one generated experiment.
//!
//! The launch script runs as its own process group with the experiment
//! directory as working directory; the controlling process never changes its
//! own working directory. A supervisor loop polls the script until it exits or
//! the wall-clock budget runs out. On timeout every process the experiment
//! started is killed: the script's process group, the job groups recorded in
//! the PID file, and finally a best-effort sweep of processes matching the
//! configured name patterns.
//!
//! The name-pattern sweep is system-wide, so experiments must never run
//! concurrently with one another.

use std::fs::{self, File};
use std::io;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use cosim_core::launch::{LAUNCH_SCRIPT_NAME, PID_FILE_NAME, SUPERVISOR_ABORT_STATUS};
use log::{debug, error, warn};
use serde::Serialize;
use thiserror::Error;

use crate::timing::{read_timing_log, TimingMetrics, TIMING_LOG_NAME};

pub const SIM_OUTPUT_NAME: &str = "sim.out";
pub const SIM_ERROR_NAME: &str = "sim.err";

/// Process name patterns matching every broker and federate program.
pub const DEFAULT_CLEANUP_PATTERNS: [&str; 2] = ["_broker", "testFed"];

const SCRIPT_INTERPRETER: &str = "bash";
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    Timeout,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one experiment plus its timings; timings are zero unless it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExperimentResult {
    pub outcome: Outcome,
    #[serde(flatten)]
    pub timings: TimingMetrics,
}

impl ExperimentResult {
    pub fn success(timings: TimingMetrics) -> Self {
        Self {
            outcome: Outcome::Success,
            timings,
        }
    }

    pub fn failure() -> Self {
        Self {
            outcome: Outcome::Failure,
            timings: TimingMetrics::default(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            outcome: Outcome::Timeout,
            timings: TimingMetrics::default(),
        }
    }
}

#[derive(Debug, Error)]
enum RunError {
    #[error("experiment directory {path} is not accessible: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to start {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to poll the launch script: {0}")]
    Wait(#[source] io::Error),
}

enum Completion {
    Exited(ExitStatus),
    TimedOut,
}

/// Runs generated experiments under a hard wall-clock timeout.
#[derive(Debug, Clone)]
pub struct ExperimentRunner {
    timeout: Duration,
    settle_delay: Duration,
    poll_interval: Duration,
    cleanup_patterns: Vec<String>,
}

impl ExperimentRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cleanup_patterns: DEFAULT_CLEANUP_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
        }
    }

    /// Pause before launching, giving sockets from the previous experiment time to close.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Name patterns passed to `pkill -9` after a timeout; empty disables the sweep.
    pub fn with_cleanup_patterns(mut self, patterns: Vec<String>) -> Self {
        self.cleanup_patterns = patterns;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the launch script in `experiment_dir` to completion or timeout.
    pub fn run(&self, experiment_dir: impl AsRef<Path>) -> ExperimentResult {
        let dir = experiment_dir.as_ref();
        match self.execute(dir) {
            Ok(Completion::Exited(status)) if status.success() => collect_timings(dir),
            Ok(Completion::Exited(status)) => {
                // No job may outlive a failed experiment.
                kill_recorded_jobs(dir);
                match status.code() {
                    Some(SUPERVISOR_ABORT_STATUS) => warn!(
                        "{}: a broker or federate exited abnormally, experiment aborted",
                        dir.display()
                    ),
                    Some(code) => warn!(
                        "{}: launch script exited with status {code}",
                        dir.display()
                    ),
                    None => warn!("{}: launch script was terminated by a signal", dir.display()),
                }
                ExperimentResult::failure()
            }
            Ok(Completion::TimedOut) => {
                warn!(
                    "{}: experiment exceeded {:?} and was killed",
                    dir.display(),
                    self.timeout
                );
                ExperimentResult::timeout()
            }
            Err(err) => {
                error!("{}: {err}", dir.display());
                ExperimentResult::failure()
            }
        }
    }

    fn execute(&self, experiment_dir: &Path) -> Result<Completion, RunError> {
        let dir = fs::canonicalize(experiment_dir).map_err(|source| RunError::Directory {
            path: experiment_dir.to_path_buf(),
            source,
        })?;

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }

        let stdout = create_output(&dir.join(SIM_OUTPUT_NAME))?;
        let stderr = create_output(&dir.join(SIM_ERROR_NAME))?;
        let script = dir.join(LAUNCH_SCRIPT_NAME);

        let mut child = Command::new(SCRIPT_INTERPRETER)
            .arg(&script)
            .current_dir(&dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .process_group(0)
            .spawn()
            .map_err(|source| RunError::Spawn {
                path: script.clone(),
                source,
            })?;
        debug!("started {} as pid {}", script.display(), child.id());

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(Completion::Exited(status)),
                Ok(None) => {}
                Err(source) => {
                    self.terminate(&mut child, &dir);
                    return Err(RunError::Wait(source));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                self.terminate(&mut child, &dir);
                return Ok(Completion::TimedOut);
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    /// Kill everything the experiment started. Never fails; problems are logged.
    fn terminate(&self, child: &mut Child, dir: &Path) {
        kill_process_group(child.id());
        if let Err(err) = child.kill() {
            debug!("launch script already gone: {err}");
        }
        if let Err(err) = child.wait() {
            warn!("failed to reap launch script: {err}");
        }

        kill_recorded_jobs(dir);

        for pattern in &self.cleanup_patterns {
            kill_by_name(pattern);
        }
    }
}

fn collect_timings(dir: &Path) -> ExperimentResult {
    match read_timing_log(dir.join(TIMING_LOG_NAME)) {
        Ok(timings) => ExperimentResult::success(timings),
        Err(err) => {
            warn!("{}: {err}; recording the run as failed", dir.display());
            ExperimentResult::failure()
        }
    }
}

fn create_output(path: &Path) -> Result<File, RunError> {
    File::create(path).map_err(|source| RunError::Output {
        path: path.to_path_buf(),
        source,
    })
}

/// Job PIDs the launch script recorded; with job control each is its own group leader.
fn recorded_job_pids(dir: &Path) -> Vec<u32> {
    fs::read_to_string(dir.join(PID_FILE_NAME))
        .map(|contents| parse_pid_list(&contents))
        .unwrap_or_default()
}

fn kill_recorded_jobs(dir: &Path) {
    for pid in recorded_job_pids(dir) {
        kill_process_group(pid);
    }
}

fn parse_pid_list(contents: &str) -> Vec<u32> {
    contents
        .lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .collect()
}

fn kill_process_group(pgid: u32) {
    let pgid = match libc::pid_t::try_from(pgid) {
        Ok(pgid) if pgid > 1 => pgid,
        _ => return,
    };
    // SAFETY: killpg only sends a signal; a stale group id fails with ESRCH.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(
            "process group {pgid} not signalled: {}",
            io::Error::last_os_error()
        );
    }
}

fn kill_by_name(pattern: &str) {
    let status = Command::new("pkill")
        .args(["-9", pattern])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if status.success() => debug!("killed stray processes matching '{pattern}'"),
        Ok(_) => {}
        Err(err) => warn!("could not sweep processes matching '{pattern}': {err}"),
    }
}
