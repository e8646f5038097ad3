//! Single sandboxed attempt with deadline and cancellation.
//!
//! An attempt builds the solver image, launches one container, then races
//! three participants:
//!
//! 1. the container process exiting,
//! 2. the attempt deadline,
//! 3. the run-wide cancellation token.
//!
//! Whatever wins, a launched container is removed exactly once before the
//! attempt returns. Removal failures are logged and never change the outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep_until;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::job::AttemptOutcome;
use super::sandbox::{ExitReport, SandboxError, SandboxProcess, SandboxRunner, SandboxSpec};

/// Maximum number of stderr bytes attached to a failure log event.
const MAX_LOGGED_STDERR: usize = 1024 * 1024;

/// Outcome of one attempt plus supervision details.
#[derive(Debug, Clone)]
pub struct AttemptReport {
    /// Attempt outcome.
    pub outcome: AttemptOutcome,
    /// Container used, if one was launched.
    pub container: Option<String>,
    /// Wall time from attempt start to cleanup completion.
    pub elapsed: Duration,
}

/// Why the race ended without a normal exit.
enum Interrupt {
    Deadline,
    Cancelled,
}

/// Runs sandbox attempts on behalf of job controllers.
#[derive(Clone)]
pub struct AttemptRunner {
    sandbox: Arc<dyn SandboxRunner>,
    cancel: CancellationToken,
}

impl AttemptRunner {
    /// Create a runner over a sandbox capability and the run's cancellation token.
    pub fn new(sandbox: Arc<dyn SandboxRunner>, cancel: CancellationToken) -> Self {
        Self { sandbox, cancel }
    }

    /// Execute one attempt under `timeout`.
    pub async fn run(&self, spec: &SandboxSpec, timeout: Duration) -> AttemptReport {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + timeout;

        let report = |outcome: AttemptOutcome, container: Option<String>| AttemptReport {
            outcome,
            container,
            elapsed: started.elapsed(),
        };

        // Build phase: no container exists yet, so nothing to clean up on any branch.
        let image = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                info!(job = %spec.job_name, "cancelled during image build");
                return report(AttemptOutcome::Cancelled, None);
            }
            () = sleep_until(deadline) => {
                info!(job = %spec.job_name, ?timeout, "deadline reached during image build");
                return report(AttemptOutcome::Timeout, None);
            }
            built = self.sandbox.build(spec) => match built {
                Ok(image) => image,
                Err(err) => {
                    warn!(job = %spec.job_name, error = %err, "failed to build sandbox image");
                    return report(AttemptOutcome::SpawnError, None);
                }
            },
        };

        let mut process = match self.sandbox.launch(spec, &image).await {
            Ok(process) => process,
            Err(err) => {
                warn!(job = %spec.job_name, error = %err, "failed to start sandbox");
                return report(AttemptOutcome::SpawnError, None);
            }
        };
        info!(
            job = %spec.job_name,
            attempt = spec.attempt,
            pid = ?process.pid(),
            container = %spec.container_name,
            "attempt started"
        );

        let raced = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Interrupt::Cancelled),
            () = sleep_until(deadline) => Err(Interrupt::Deadline),
            exit = process.wait() => Ok(exit),
        };

        let outcome = match raced {
            Ok(exit) => Self::classify_exit(spec, exit),
            Err(interrupt) => {
                let outcome = match interrupt {
                    Interrupt::Deadline => {
                        info!(job = %spec.job_name, ?timeout, "deadline reached, killing sandbox");
                        AttemptOutcome::Timeout
                    }
                    Interrupt::Cancelled => {
                        info!(job = %spec.job_name, "termination requested, cleaning up sandbox");
                        AttemptOutcome::Cancelled
                    }
                };
                Self::kill(spec, &mut process).await;
                outcome
            }
        };

        self.release(&spec.container_name).await;
        report(outcome, Some(spec.container_name.clone()))
    }

    fn classify_exit(spec: &SandboxSpec, exit: Result<ExitReport, SandboxError>) -> AttemptOutcome {
        match exit {
            Ok(exit) if exit.success() => {
                info!(job = %spec.job_name, "exited with status code 0");
                AttemptOutcome::Success
            }
            Ok(exit) => {
                info!(
                    job = %spec.job_name,
                    exit_code = ?exit.code,
                    stderr = %truncate_stderr(&exit.stderr),
                    "attempt failed"
                );
                AttemptOutcome::Failure {
                    exit_code: exit.code,
                }
            }
            Err(err) => {
                warn!(job = %spec.job_name, error = %err, "lost track of sandbox process");
                AttemptOutcome::Failure { exit_code: None }
            }
        }
    }

    async fn kill(spec: &SandboxSpec, process: &mut Box<dyn SandboxProcess>) {
        if let Err(err) = process.kill().await {
            warn!(job = %spec.job_name, error = %err, "failed to kill sandbox process");
        }
    }

    /// Remove the container once; errors are logged, never retried.
    async fn release(&self, container: &str) {
        match self.sandbox.remove(container).await {
            Ok(()) => debug!(container, "container removed"),
            Err(err) => warn!(container, error = %err, "failed to remove container"),
        }
    }
}

fn truncate_stderr(stderr: &str) -> &str {
    if stderr.len() <= MAX_LOGGED_STDERR {
        return stderr;
    }
    let mut end = MAX_LOGGED_STDERR;
    while !stderr.is_char_boundary(end) {
        end -= 1;
    }
    &stderr[..end]
}
