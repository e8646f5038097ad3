//! Sandbox capability traits.
//!
//! The checker never talks to a container runtime directly. An attempt asks a
//! [`SandboxRunner`] to build an image from the solver directory, launch one
//! ephemeral container from it, and later remove that container. The running
//! container is represented by a [`SandboxProcess`] that can be awaited or
//! killed.
//!
//! Two implementations ship with the crate: `DockerSandbox`, which shells out
//! to the local container CLI, and `MockSandbox`, a scripted double for tests.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use super::job::JobId;

/// Everything a sandbox needs to run one attempt.
#[derive(Debug, Clone)]
pub struct SandboxSpec {
    /// Challenge identifier.
    pub job_id: JobId,
    /// Display name (for logs).
    pub job_name: String,
    /// Directory holding the build descriptor.
    pub solver_dir: PathBuf,
    /// Image tag to build.
    pub image_tag: String,
    /// Unique container name for this attempt.
    pub container_name: String,
    /// Attempt number, starting at 1.
    pub attempt: u32,
}

/// Exit information of a finished sandbox process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit status; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard error.
    pub stderr: String,
}

impl ExitReport {
    /// True when the process exited with status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Errors raised by sandbox implementations.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The runtime process could not be started.
    #[error("failed to spawn sandbox process: {0}")]
    Spawn(#[source] std::io::Error),
    /// Building the image failed.
    #[error("image build failed (status {status:?}): {stderr}")]
    Build {
        /// Exit status of the build.
        status: Option<i32>,
        /// Captured build error output.
        stderr: String,
    },
    /// I/O failure while supervising a running process.
    #[error("sandbox I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Removing a container failed.
    #[error("failed to remove container {container}: {reason}")]
    Cleanup {
        /// Container name.
        container: String,
        /// Runtime error output.
        reason: String,
    },
}

/// A launched sandbox container.
#[async_trait]
pub trait SandboxProcess: Send {
    /// OS process id of the supervising process, if known.
    fn pid(&self) -> Option<u32>;

    /// Wait for the process to exit. Must be cancel-safe.
    async fn wait(&mut self) -> Result<ExitReport, SandboxError>;

    /// Force-kill the process.
    async fn kill(&mut self) -> Result<(), SandboxError>;
}

/// Capability to build, launch, and remove sandbox containers.
#[async_trait]
pub trait SandboxRunner: Send + Sync + 'static {
    /// Build an image from `spec.solver_dir` and return its reference.
    ///
    /// Dropping the returned future must abort the build.
    async fn build(&self, spec: &SandboxSpec) -> Result<String, SandboxError>;

    /// Start one ephemeral container named `spec.container_name` from `image`.
    ///
    /// An error means no container was created.
    async fn launch(
        &self,
        spec: &SandboxSpec,
        image: &str,
    ) -> Result<Box<dyn SandboxProcess>, SandboxError>;

    /// Force-remove a container. A container that is already gone is not an error.
    async fn remove(&self, container: &str) -> Result<(), SandboxError>;
}
