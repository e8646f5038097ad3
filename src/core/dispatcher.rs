//! Bounded-concurrency dispatcher.
//!
//! Jobs wait in a FIFO queue. Up to `parallelism` job controllers run at
//! once; each one reports back through a completion set, and the freed slot
//! is refilled from the front of the queue right after the finished job's
//! result has been handed to the sink. With `parallelism = 1` this is plain
//! sequential execution in enumeration order.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::context::CheckerContext;
use super::controller::JobController;
use super::error::CheckerError;
use super::job::{JobReport, JobResult};
use super::sink::{ResultRecord, ResultSink};
use crate::util::clock::now_ms;

/// Terminal reports of one completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Reports in completion order.
    pub reports: Vec<JobReport>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Number of reports with the given result.
    #[must_use]
    pub fn count(&self, result: JobResult) -> usize {
        self.reports.iter().filter(|r| r.result == result).count()
    }

    /// Report for the job at `path`, if it ran.
    #[must_use]
    pub fn report_for(&self, path: &std::path::Path) -> Option<&JobReport> {
        self.reports.iter().find(|r| r.path == path)
    }
}

/// Admits jobs into a bounded set of running controllers and collects their results.
pub struct Dispatcher {
    ctx: CheckerContext,
    sink: Option<Arc<dyn ResultSink>>,
}

impl Dispatcher {
    /// Create a dispatcher. Persistence is enabled when `sink` is `Some`.
    pub fn new(ctx: CheckerContext, sink: Option<Arc<dyn ResultSink>>) -> Self {
        Self { ctx, sink }
    }

    /// Run every job to a terminal result.
    ///
    /// Each report is forwarded to `observer` (if any) as soon as it is recorded.
    ///
    /// # Errors
    ///
    /// Returns `CheckerError::Cancelled` if the run's token is cancelled. In-flight
    /// jobs finish their sandbox cleanup first; queued jobs are abandoned.
    pub async fn run_all(
        &self,
        jobs: Vec<PathBuf>,
        observer: Option<UnboundedSender<JobReport>>,
    ) -> Result<RunSummary, CheckerError> {
        let started = Instant::now();
        let parallelism = self.ctx.settings.parallelism.max(1);
        let mut waiting: VecDeque<PathBuf> = jobs.into();
        let mut active: JoinSet<Result<JobReport, CheckerError>> = JoinSet::new();
        let mut reports = Vec::with_capacity(waiting.len());
        let mut cancelled = false;

        info!(
            run_id = %self.ctx.run_id,
            jobs = waiting.len(),
            parallelism,
            "dispatching jobs"
        );

        self.admit(&mut waiting, &mut active, parallelism);

        while let Some(joined) = active.join_next().await {
            match joined {
                Ok(Ok(report)) => {
                    info!(job = %report.name, result = %report.result, "test execution finished");
                    self.record(&report).await;
                    if let Some(observer) = &observer {
                        let _ = observer.send(report.clone());
                    }
                    reports.push(report);
                }
                Ok(Err(CheckerError::Cancelled)) => cancelled = true,
                Ok(Err(err)) => error!(error = %err, "job controller failed"),
                Err(err) => error!(error = %err, "job controller task aborted"),
            }

            if self.ctx.cancel.is_cancelled() {
                cancelled = true;
            }
            if !cancelled {
                self.admit(&mut waiting, &mut active, parallelism);
            }
        }

        if cancelled {
            warn!(
                completed = reports.len(),
                abandoned = waiting.len(),
                "run cancelled"
            );
            return Err(CheckerError::Cancelled);
        }

        let summary = RunSummary {
            reports,
            elapsed: started.elapsed(),
        };
        info!(
            jobs = summary.reports.len(),
            elapsed = ?summary.elapsed,
            "run finished"
        );
        Ok(summary)
    }

    /// Start queued jobs from the front until the slots are full.
    fn admit(
        &self,
        waiting: &mut VecDeque<PathBuf>,
        active: &mut JoinSet<Result<JobReport, CheckerError>>,
        parallelism: usize,
    ) {
        while active.len() < parallelism {
            let Some(path) = waiting.pop_front() else {
                break;
            };
            debug!(job = %path.display(), "admitting job");
            let controller = JobController::new(path.clone(), self.ctx.clone());
            active.spawn(supervise(path, controller));
        }
    }

    /// Persist a report; failures are logged and never change the result.
    async fn record(&self, report: &JobReport) {
        let Some(sink) = &self.sink else {
            return;
        };
        let Some(record) = ResultRecord::from_report(report, now_ms()) else {
            warn!(job = %report.name, "job has no id, result not recorded");
            return;
        };
        if let Err(err) = sink.record_result(record).await {
            warn!(job = %report.name, error = %err, "failed to record result");
        }
    }
}

/// Run a controller on its own task so a panic still yields a terminal report.
async fn supervise(path: PathBuf, controller: JobController) -> Result<JobReport, CheckerError> {
    match tokio::spawn(controller.run()).await {
        Ok(result) => result,
        Err(err) => {
            error!(job = %path.display(), error = %err, "job controller panicked");
            Ok(JobReport::unidentified(&path, JobResult::Failure))
        }
    }
}
