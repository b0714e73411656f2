// src/job/runner.rs

//! Bounded supervision of lifecycle script execution.
//!
//! The runner resolves a package's lifecycle script, launches it as a
//! subprocess, drains its output streams concurrently through two
//! [`StreamPump`]s, and enforces a wall-clock timeout. The job is expected
//! to start or stop the service and then terminate; a script that hangs for
//! an unacceptably long time or produces exorbitant amounts of output is
//! unceremoniously terminated.
//!
//! Supervision is total: every expected failure mode comes back as a
//! [`JobResult`], never as an `Err`. The two forced-termination paths
//! (overflow, timeout) discard partial output and return empty buffers;
//! partial data from a killed process is not to be trusted.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use super::pump::{PumpEvent, StreamKind, StreamPump};
use super::{Job, JobResult, JobStatus};
use crate::config::Configuration;
use crate::coordinate::Coordinate;
use crate::install::SCRIPT_DIR;

/// Wall-clock budget for one supervised execution (180 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Byte ceiling applied to each output stream (64 KiB)
const DEFAULT_OUTPUT_CEILING: u64 = 64 * 1024;

/// Which lifecycle script to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Start,
    Stop,
}

impl ScriptKind {
    /// Filename of the script inside the package's `script.d` directory
    pub fn filename(&self) -> &'static str {
        match self {
            ScriptKind::Start => "start.py",
            ScriptKind::Stop => "stop.py",
        }
    }
}

/// How the completion barrier resolved
enum Barrier {
    /// Both pumps reached a terminal state within the budget
    Drained,
    /// A pump crossed the output ceiling
    Overflowed,
    /// The budget ran out first
    TimedOut,
}

/// Supervises lifecycle script execution for installed packages
pub struct JobRunner {
    config: Configuration,
    timeout: Duration,
    output_ceiling: u64,
}

impl JobRunner {
    /// Create a runner with the fixed production bounds
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            timeout: DEFAULT_TIMEOUT,
            output_ceiling: DEFAULT_OUTPUT_CEILING,
        }
    }

    /// Override the wall-clock budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the per-stream output ceiling (0 disables it)
    pub fn with_output_ceiling(mut self, ceiling: u64) -> Self {
        self.output_ceiling = ceiling;
        self
    }

    /// Path of the lifecycle script for a coordinate
    pub fn script_path(&self, coordinate: &Coordinate, kind: ScriptKind) -> PathBuf {
        self.config
            .install_path_for(coordinate)
            .join(SCRIPT_DIR)
            .join(kind.filename())
    }

    /// Run a job's lifecycle script under supervision.
    ///
    /// Never returns an error for expected failure modes; the result's
    /// status classifies what happened.
    pub fn run(&self, job: &Job, kind: ScriptKind) -> JobResult {
        let coordinate = match Coordinate::parse(&job.package_coordinate) {
            Ok(c) => c,
            Err(e) => return JobResult::error(JobStatus::Other, e.to_string()),
        };

        let script = self.script_path(&coordinate, kind);
        info!("lifecycle script: {}", script.display());

        if !script.exists() {
            return JobResult::error(
                JobStatus::ScriptNotFound,
                format!("script does not exist: {}", script.display()),
            );
        }
        match fs::metadata(&script) {
            Ok(meta) if meta.permissions().mode() & 0o111 != 0 => {}
            Ok(_) => {
                return JobResult::error(
                    JobStatus::ScriptNotExecutable,
                    format!("script is not executable: {}", script.display()),
                );
            }
            Err(e) => {
                return JobResult::error(
                    JobStatus::Other,
                    format!("cannot stat script {}: {e}", script.display()),
                );
            }
        }

        let mut child = match Command::new(&script)
            .args(job.option_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return JobResult::error(
                    JobStatus::Other,
                    format!("failed to spawn {}: {e}", script.display()),
                );
            }
        };

        self.supervise(&mut child)
    }

    /// Drain the child's output under the ceiling, wait on the completion
    /// barrier, and classify the outcome.
    fn supervise(&self, child: &mut Child) -> JobResult {
        let deadline = Instant::now() + self.timeout;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            terminate(child);
            return JobResult::error(JobStatus::Other, "could not capture child output streams");
        };

        let (tx, rx) = mpsc::channel();
        let tx_err = tx.clone();

        let out_pump = StreamPump::new(StreamKind::Stdout, stdout, Vec::new(), self.output_ceiling);
        let err_pump = StreamPump::new(StreamKind::Stderr, stderr, Vec::new(), self.output_ceiling);
        let out_handle = thread::spawn(move || out_pump.run(&tx));
        let err_handle = thread::spawn(move || err_pump.run(&tx_err));

        // Barrier: both pumps terminal, first overflow wins, bounded by the
        // wall clock.
        let mut terminal = 0;
        let barrier = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break Barrier::TimedOut;
            }
            match rx.recv_timeout(remaining) {
                Ok(PumpEvent::OverLimit(kind)) => {
                    warn!("output ceiling exceeded on {kind:?}");
                    break Barrier::Overflowed;
                }
                Ok(PumpEvent::Finished(kind)) | Ok(PumpEvent::Failed(kind)) => {
                    debug!("stream {kind:?} terminal");
                    terminal += 1;
                    if terminal == 2 {
                        break Barrier::Drained;
                    }
                }
                Err(RecvTimeoutError::Timeout) => break Barrier::TimedOut,
                // Both senders gone means both pumps exited.
                Err(RecvTimeoutError::Disconnected) => break Barrier::Drained,
            }
        };

        match barrier {
            Barrier::Overflowed => {
                terminate(child);
                JobResult::error(
                    JobStatus::Other,
                    format!(
                        "script produced more than {} bytes of output and was terminated",
                        self.output_ceiling
                    ),
                )
            }
            Barrier::TimedOut => {
                terminate(child);
                JobResult::error(
                    JobStatus::Other,
                    format!(
                        "script did not complete within {} seconds and was terminated",
                        self.timeout.as_secs()
                    ),
                )
            }
            Barrier::Drained => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match child.wait_timeout(remaining) {
                    Ok(Some(status)) => {
                        let stdout = collect_sink(out_handle);
                        let stderr = collect_sink(err_handle);
                        JobResult::completed(stdout, stderr, status.code().unwrap_or(-1))
                    }
                    Ok(None) => {
                        terminate(child);
                        JobResult::error(
                            JobStatus::Other,
                            format!(
                                "script did not complete within {} seconds and was terminated",
                                self.timeout.as_secs()
                            ),
                        )
                    }
                    Err(e) => {
                        terminate(child);
                        JobResult::error(
                            JobStatus::Other,
                            format!("failed waiting for script: {e}"),
                        )
                    }
                }
            }
        }
    }
}

/// Forcibly terminate the child and reap it
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Collect a pump thread's sink as lossy UTF-8
fn collect_sink(handle: thread::JoinHandle<Vec<u8>>) -> String {
    match handle.join() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => {
            warn!("output pump thread panicked; output lost");
            String::new()
        }
    }
}
