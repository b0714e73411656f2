// src/job/mod.rs

//! Job descriptions and results for lifecycle script execution.
//!
//! A `Job` names the package whose lifecycle script should run, the runtime
//! directory handed to the script, and the parameters appended to the
//! command line. Jobs are immutable, constructed per invocation (from the
//! command line or a transmitted JSON description), and never mutated.
//!
//! A `JobResult` is produced exactly once per supervised execution and is
//! never partially filled: error short circuits carry empty output buffers
//! and exit code 0 by convention.

pub mod pump;
pub mod runner;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Description of one lifecycle script invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Working directory handed to the script via `--working-directory`
    pub runtime_directory: String,

    /// Coordinate of the package whose script should run
    pub package_coordinate: String,

    /// Extra parameters, passed to the script verbatim and in order
    #[serde(default)]
    pub params: Vec<String>,
}

impl Job {
    /// Create a new job
    pub fn new(
        runtime_directory: impl Into<String>,
        package_coordinate: impl Into<String>,
        params: Vec<String>,
    ) -> Self {
        Self {
            runtime_directory: runtime_directory.into(),
            package_coordinate: package_coordinate.into(),
            params,
        }
    }

    /// Parse a JSON job description
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render this job as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The full argument list emitted to the subprocess after the script
    /// path: the fixed working-directory pair, then the params in order.
    pub fn option_args(&self) -> Vec<String> {
        let mut args = vec![
            "--working-directory".to_string(),
            self.runtime_directory.clone(),
        ];
        args.extend(self.params.iter().cloned());
        args
    }
}

/// Classified outcome of a supervised execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// The script ran to completion and exited 0
    Success,
    /// No script at the expected path; no process was spawned
    ScriptNotFound,
    /// Script present but lacking execute permission; no process spawned
    ScriptNotExecutable,
    /// The script ran to completion but exited non-zero
    ErrorCodeReturned,
    /// Launch failure, output overflow, or timeout
    Other,
}

/// Result of running a job.
///
/// Supervised execution is total: every invocation produces a fully-formed
/// result rather than an error, so callers can always inspect the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Classified outcome
    pub status: JobStatus,
    /// Human readable message describing what happened
    pub message: String,
    /// Exit code of the process; 0 by convention on short-circuit errors
    pub exit_code: i32,
}

impl JobResult {
    /// Result for a run that produced output and an exit code
    pub fn completed(stdout: String, stderr: String, exit_code: i32) -> Self {
        let (status, message) = if exit_code == 0 {
            (JobStatus::Success, String::new())
        } else {
            (
                JobStatus::ErrorCodeReturned,
                format!("script exited with code {exit_code}"),
            )
        };
        Self {
            stdout,
            stderr,
            status,
            message,
            exit_code,
        }
    }

    /// Result for a failure path that produced no usable output.
    /// Everything except status and message is set to neutral values.
    pub fn error(status: JobStatus, message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            status,
            message: message.into(),
            exit_code: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: &[&str] = &[
        "--9",
        "--alpha-key=alpha value",
        "--beta-key=beta value",
        "--delta-key=",
        "--gamma-key=gamma value",
    ];

    fn test_job() -> Job {
        Job::new(
            "/var/run/example",
            "com.example:artifact:2.2.1",
            PARAMS.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_json_round_trip() {
        let job = test_job();
        let parsed = Job::parse(&job.to_json().unwrap()).unwrap();
        assert_eq!(parsed, job);
    }

    #[test]
    fn test_option_args_order() {
        let args = test_job().option_args();
        assert_eq!(args[0], "--working-directory");
        assert_eq!(args[1], "/var/run/example");
        assert_eq!(&args[2..], PARAMS);
    }

    #[test]
    fn test_error_result_neutral_fields() {
        let result = JobResult::error(JobStatus::ScriptNotFound, "no script");
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.status, JobStatus::ScriptNotFound);
    }

    #[test]
    fn test_completed_classification() {
        assert_eq!(
            JobResult::completed(String::new(), String::new(), 0).status,
            JobStatus::Success
        );
        assert_eq!(
            JobResult::completed(String::new(), String::new(), 3).status,
            JobStatus::ErrorCodeReturned
        );
    }
}
