//! Job, manifest, and result data types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Challenge identifier taken from the manifest.
pub type JobId = u64;

/// Per-job JSON descriptor (`info.json` by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Display name.
    pub name: String,
    /// Challenge identifier.
    pub id: JobId,
    /// Whether a job that cannot be executed counts as a success.
    #[serde(default, rename = "default")]
    pub default_success: bool,
    /// Per-job timeout override in seconds.
    #[serde(default)]
    pub timeout: Option<f64>,
}

impl Manifest {
    /// Parse a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the text is not a valid manifest.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Timeout override, if it is a usable positive duration.
    #[must_use]
    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Result to fall back to when the job cannot be executed.
    #[must_use]
    pub const fn fallback_result(&self) -> JobResult {
        if self.default_success {
            JobResult::SuccessWithoutExecution
        } else {
            JobResult::NotExecuted
        }
    }
}

/// A prepared job, exclusively owned by its controller.
#[derive(Debug, Clone)]
pub struct Job {
    /// Challenge identifier.
    pub id: JobId,
    /// Display name.
    pub name: String,
    /// Job directory.
    pub path: PathBuf,
    /// Resolved solver directory holding the build descriptor.
    pub solver_dir: PathBuf,
    /// Manifest default-success flag.
    pub default_success: bool,
    /// Per-job timeout override.
    pub timeout: Option<Duration>,
    /// Retries allowed beyond the first attempt.
    pub max_retries: u32,
    /// Attempts performed so far.
    pub attempts: u32,
}

impl Job {
    /// Timeout for one attempt: the manifest override, else `default`.
    #[must_use]
    pub fn effective_timeout(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }

    /// Sandbox image tag for this job.
    #[must_use]
    pub fn image_tag(&self) -> String {
        format!("solver_{}", self.id)
    }

    /// Container name for the given attempt within a run.
    #[must_use]
    pub fn container_name(&self, attempt: u32, run_tag: &str) -> String {
        format!("container_solver_{}_{attempt}_{run_tag}", self.id)
    }

    /// Build the terminal report for this job.
    #[must_use]
    pub fn report(&self, result: JobResult) -> JobReport {
        JobReport {
            id: Some(self.id),
            name: self.name.clone(),
            path: self.path.clone(),
            result,
            attempts: self.attempts,
        }
    }
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobResult {
    /// The solver exited with status 0.
    Success,
    /// The job could not run but its manifest defaults to success.
    SuccessWithoutExecution,
    /// The last attempt exceeded its deadline.
    Timeout,
    /// The job could not run and has no default-success fallback.
    NotExecuted,
    /// The last attempt failed.
    Failure,
}

impl JobResult {
    /// Stable integer code used by the historical result table.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::SuccessWithoutExecution => 1,
            Self::Timeout => 2,
            Self::NotExecuted => 3,
            Self::Failure => 4,
        }
    }

    /// Short label shown on status badges.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Success | Self::SuccessWithoutExecution => "Success",
            Self::Timeout => "Timeout",
            Self::NotExecuted => "test not executed",
            Self::Failure => "Failure",
        }
    }

    /// Hex color (no leading `#`) shown on status badges.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Success => "33FF99",
            Self::SuccessWithoutExecution => "66FF66",
            Self::Timeout => "6600CC",
            Self::NotExecuted => "808080",
            Self::Failure => "CC0000",
        }
    }

    /// True for both success variants.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::SuccessWithoutExecution)
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "Success",
            Self::SuccessWithoutExecution => "SuccessWithoutExecution",
            Self::Timeout => "Timeout",
            Self::NotExecuted => "NotExecuted",
            Self::Failure => "Failure",
        };
        f.write_str(name)
    }
}

/// Outcome of a single sandbox attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Process exited with status 0.
    Success,
    /// Process exited non-zero, or was killed by a signal (`exit_code` is `None`).
    Failure {
        /// Exit status, when the process exited normally.
        exit_code: Option<i32>,
    },
    /// Deadline fired before the process exited.
    Timeout,
    /// The sandbox could not be built or started.
    SpawnError,
    /// The run was cancelled while the attempt was in flight.
    Cancelled,
}

impl AttemptOutcome {
    /// Terminal result this outcome maps to once retries are exhausted.
    ///
    /// Returns `None` for `Cancelled`, which never becomes a terminal result.
    #[must_use]
    pub const fn terminal_result(self) -> Option<JobResult> {
        match self {
            Self::Success => Some(JobResult::Success),
            Self::Failure { .. } | Self::SpawnError => Some(JobResult::Failure),
            Self::Timeout => Some(JobResult::Timeout),
            Self::Cancelled => None,
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure {
                exit_code: Some(code),
            } => write!(f, "failure (exit {code})"),
            Self::Failure { exit_code: None } => f.write_str("failure (killed)"),
            Self::Timeout => f.write_str("timeout"),
            Self::SpawnError => f.write_str("spawn error"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Terminal report for one job, handed from controller to dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    /// Challenge identifier; `None` when the manifest could not be read.
    pub id: Option<JobId>,
    /// Display name, or the directory name when the manifest is unreadable.
    pub name: String,
    /// Job directory.
    pub path: PathBuf,
    /// Terminal result.
    pub result: JobResult,
    /// Sandbox attempts performed.
    pub attempts: u32,
}

impl JobReport {
    /// Report for a job whose manifest could not be read.
    #[must_use]
    pub fn unidentified(path: &Path, result: JobResult) -> Self {
        Self {
            id: None,
            name: dir_name(path),
            path: path.to_path_buf(),
            result,
            attempts: 0,
        }
    }
}

/// Last path component as a display name.
pub(crate) fn dir_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parse_full() {
        let m = Manifest::from_json_str(
            r#"{"name": "pwn-baby", "id": 7, "default": true, "timeout": 2.5}"#,
        )
        .unwrap();
        assert_eq!(m.name, "pwn-baby");
        assert_eq!(m.id, 7);
        assert!(m.default_success);
        assert_eq!(m.timeout_override(), Some(Duration::from_millis(2500)));
        assert_eq!(m.fallback_result(), JobResult::SuccessWithoutExecution);
    }

    #[test]
    fn test_manifest_defaults() {
        let m = Manifest::from_json_str(r#"{"name": "rev", "id": 1}"#).unwrap();
        assert!(!m.default_success);
        assert_eq!(m.timeout_override(), None);
        assert_eq!(m.fallback_result(), JobResult::NotExecuted);
    }

    #[test]
    fn test_manifest_ignores_non_positive_timeout() {
        let m = Manifest::from_json_str(r#"{"name": "a", "id": 1, "timeout": 0}"#).unwrap();
        assert_eq!(m.timeout_override(), None);
        let m = Manifest::from_json_str(r#"{"name": "a", "id": 1, "timeout": -3.0}"#).unwrap();
        assert_eq!(m.timeout_override(), None);
    }

    #[test]
    fn test_manifest_rejects_negative_id() {
        assert!(Manifest::from_json_str(r#"{"name": "a", "id": -1}"#).is_err());
        assert!(Manifest::from_json_str("not json").is_err());
    }

    #[test]
    fn test_result_presentation() {
        assert_eq!(JobResult::SuccessWithoutExecution.message(), "Success");
        assert_eq!(JobResult::NotExecuted.message(), "test not executed");
        assert_eq!(JobResult::Failure.color(), "CC0000");
        assert_eq!(JobResult::Timeout.code(), 2);
        assert_eq!(JobResult::SuccessWithoutExecution.to_string(), "SuccessWithoutExecution");
        assert!(JobResult::SuccessWithoutExecution.is_success());
        assert!(!JobResult::Timeout.is_success());
    }

    #[test]
    fn test_result_serde_names() {
        let json = serde_json::to_string(&JobResult::SuccessWithoutExecution).unwrap();
        assert_eq!(json, "\"success_without_execution\"");
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(AttemptOutcome::SpawnError.terminal_result(), Some(JobResult::Failure));
        assert_eq!(
            AttemptOutcome::Failure { exit_code: Some(1) }.terminal_result(),
            Some(JobResult::Failure)
        );
        assert_eq!(AttemptOutcome::Timeout.terminal_result(), Some(JobResult::Timeout));
        assert_eq!(AttemptOutcome::Cancelled.terminal_result(), None);
    }

    #[test]
    fn test_container_naming() {
        let job = Job {
            id: 3,
            name: "heap".into(),
            path: PathBuf::from("/c/heap"),
            solver_dir: PathBuf::from("/c/heap/exploit"),
            default_success: false,
            timeout: None,
            max_retries: 0,
            attempts: 0,
        };
        assert_eq!(job.image_tag(), "solver_3");
        assert_eq!(job.container_name(2, "deadbeef"), "container_solver_3_2_deadbeef");
        assert_eq!(job.effective_timeout(Duration::from_secs(10)), Duration::from_secs(10));
    }
}
