//! Error types for checker operations.

use std::path::PathBuf;

use thiserror::Error;

use super::job::JobId;
use super::sandbox::SandboxError;

/// Errors produced by checker components.
#[derive(Debug, Error)]
pub enum CheckerError {
    /// The challenge root could not be listed. Fatal to the whole run.
    #[error("failed to enumerate jobs under {}: {source}", path.display())]
    Enumeration {
        /// Root directory that was being listed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A job manifest is missing, unreadable, or not valid JSON.
    #[error("invalid manifest {}: {reason}", path.display())]
    Manifest {
        /// Manifest file path.
        path: PathBuf,
        /// Human-readable cause.
        reason: String,
    },
    /// The solver directory or its build descriptor is absent.
    #[error("resource missing: {0}")]
    ResourceMissing(String),
    /// The sandbox capability failed.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    /// Result persistence failed.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// No result has been recorded for the job.
    #[error("no result recorded for job {0}")]
    NotFound(JobId),
    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The run was interrupted by a termination signal.
    #[error("run cancelled by termination signal")]
    Cancelled,
}

impl From<serde_json::Error> for CheckerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
