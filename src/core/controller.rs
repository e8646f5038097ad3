//! Per-job state machine: prepare, run attempts, retry, settle on one terminal result.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::attempt::AttemptRunner;
use super::context::CheckerContext;
use super::error::CheckerError;
use super::job::{AttemptOutcome, Job, JobReport, JobResult, Manifest};
use super::sandbox::SandboxSpec;

/// Solver directory name inside a job directory.
pub const SOLVER_DIR: &str = "exploit";
/// Build descriptor expected at the root of the solver directory.
pub const BUILD_DESCRIPTOR: &str = "Dockerfile";

/// Result of the prepare phase.
#[derive(Debug)]
pub enum Preparation {
    /// The job can run.
    Ready(Job),
    /// The job settled without any attempt.
    Settled {
        /// Terminal report.
        report: JobReport,
        /// Why no attempt was made.
        reason: CheckerError,
    },
}

/// Drives one job from its directory to exactly one terminal result.
pub struct JobController {
    path: PathBuf,
    ctx: CheckerContext,
    runner: AttemptRunner,
}

impl JobController {
    /// Create a controller for the job directory at `path`.
    pub fn new(path: PathBuf, ctx: CheckerContext) -> Self {
        let runner = AttemptRunner::new(ctx.sandbox.clone(), ctx.cancel.clone());
        Self { path, ctx, runner }
    }

    /// Job directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the manifest and locate the solver's build descriptor.
    pub async fn prepare(&self) -> Preparation {
        let manifest_path = self.path.join(&self.ctx.settings.manifest_file);
        let manifest = match read_manifest(&manifest_path).await {
            Ok(manifest) => manifest,
            Err(reason) => {
                return Preparation::Settled {
                    report: JobReport::unidentified(&self.path, JobResult::NotExecuted),
                    reason,
                };
            }
        };

        let mut job = Job {
            id: manifest.id,
            name: manifest.name.clone(),
            path: self.path.clone(),
            solver_dir: self.path.join(SOLVER_DIR),
            default_success: manifest.default_success,
            timeout: manifest.timeout_override(),
            max_retries: self.ctx.settings.max_retries,
            attempts: 0,
        };
        let fallback = manifest.fallback_result();

        if let Err(reason) = self.resolve_solver_dir(&mut job).await {
            return Preparation::Settled {
                report: job.report(fallback),
                reason,
            };
        }

        let descriptor = job.solver_dir.join(BUILD_DESCRIPTOR);
        let is_file = tokio::fs::metadata(&descriptor)
            .await
            .is_ok_and(|meta| meta.is_file());
        if !is_file {
            let reason = CheckerError::ResourceMissing(format!(
                "[{}] {BUILD_DESCRIPTOR} not found in solver dir {}",
                job.name,
                job.solver_dir.display()
            ));
            return Preparation::Settled {
                report: job.report(fallback),
                reason,
            };
        }

        Preparation::Ready(job)
    }

    /// Follow one level of symlink when the solver path does not resolve directly.
    async fn resolve_solver_dir(&self, job: &mut Job) -> Result<(), CheckerError> {
        if tokio::fs::try_exists(&job.solver_dir).await.unwrap_or(false) {
            return Ok(());
        }
        let target = tokio::fs::read_link(&job.solver_dir).await.map_err(|_| {
            CheckerError::ResourceMissing(format!(
                "[{}] solver dir {} not found",
                job.name,
                job.solver_dir.display()
            ))
        })?;
        let resolved = self.path.join(target);
        info!(
            job = %job.name,
            link = %job.solver_dir.display(),
            target = %resolved.display(),
            "symlink found"
        );
        job.solver_dir = resolved;
        Ok(())
    }

    /// Run the job to its terminal result.
    ///
    /// # Errors
    ///
    /// Returns `CheckerError::Cancelled` when the run is cancelled before the
    /// job settles. Every other failure becomes a terminal [`JobResult`].
    pub async fn run(self) -> Result<JobReport, CheckerError> {
        let mut job = match self.prepare().await {
            Preparation::Ready(job) => job,
            Preparation::Settled { report, reason } => {
                info!(job = %report.name, result = %report.result, reason = %reason, "job not executed");
                return Ok(report);
            }
        };

        let timeout = job.effective_timeout(self.ctx.settings.default_timeout);
        info!(job = %job.name, job_id = job.id, ?timeout, "timeout set");
        let run_tag = self.ctx.run_tag();

        loop {
            if self.ctx.cancel.is_cancelled() {
                return Err(CheckerError::Cancelled);
            }

            job.attempts += 1;
            let spec = SandboxSpec {
                job_id: job.id,
                job_name: job.name.clone(),
                solver_dir: job.solver_dir.clone(),
                image_tag: job.image_tag(),
                container_name: job.container_name(job.attempts, &run_tag),
                attempt: job.attempts,
            };
            info!(job = %job.name, attempt = job.attempts, "starting attempt");
            let attempt = self.runner.run(&spec, timeout).await;
            info!(
                job = %job.name,
                attempt = job.attempts,
                outcome = %attempt.outcome,
                container = ?attempt.container,
                elapsed = ?attempt.elapsed,
                "attempt finished"
            );

            let Some(result) = attempt.outcome.terminal_result() else {
                return Err(CheckerError::Cancelled);
            };
            if attempt.outcome == AttemptOutcome::Success {
                return Ok(job.report(result));
            }
            if job.attempts <= job.max_retries {
                info!(
                    job = %job.name,
                    attempt = job.attempts,
                    max_retries = job.max_retries,
                    "retrying test"
                );
                continue;
            }
            warn!(job = %job.name, attempts = job.attempts, result = %result, "retries exhausted");
            return Ok(job.report(result));
        }
    }
}

async fn read_manifest(path: &Path) -> Result<Manifest, CheckerError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|err| CheckerError::Manifest {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    Manifest::from_json_str(&text).map_err(|err| CheckerError::Manifest {
        path: path.to_path_buf(),
        reason: format!("failed to parse as JSON: {err}"),
    })
}
