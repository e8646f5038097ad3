//! Explicit run context threaded through the dispatcher, controllers, and runners.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::sandbox::SandboxRunner;

/// Settings shared by every job of a run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Manifest file name inside each job directory.
    pub manifest_file: String,
    /// Attempt timeout used when the manifest has no override.
    pub default_timeout: Duration,
    /// Retries allowed beyond the first attempt.
    pub max_retries: u32,
    /// Maximum number of jobs running at once.
    pub parallelism: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            manifest_file: "info.json".into(),
            default_timeout: Duration::from_secs(10),
            max_retries: 0,
            parallelism: 1,
        }
    }
}

/// Context for one run: settings, the sandbox capability, and the cancellation token.
#[derive(Clone)]
pub struct CheckerContext {
    /// Shared settings.
    pub settings: Arc<RunSettings>,
    /// Sandbox capability.
    pub sandbox: Arc<dyn SandboxRunner>,
    /// Cancelled when a termination signal arrives.
    pub cancel: CancellationToken,
    /// Identifier of this run.
    pub run_id: Uuid,
}

impl CheckerContext {
    /// Create a context with a fresh run id.
    pub fn new(
        settings: RunSettings,
        sandbox: Arc<dyn SandboxRunner>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            sandbox,
            cancel,
            run_id: Uuid::new_v4(),
        }
    }

    /// Same settings, sandbox and token, with a new run id.
    #[must_use]
    pub fn next_run(&self) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Short run tag used in container names.
    #[must_use]
    pub fn run_tag(&self) -> String {
        let mut tag = self.run_id.simple().to_string();
        tag.truncate(8);
        tag
    }
}

impl std::fmt::Debug for CheckerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckerContext")
            .field("settings", &self.settings)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}
