//! Checker entry points: one round, or rounds on an interval.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::core::{
    enumerate_jobs, CheckerContext, CheckerError, Dispatcher, JobReport, ResultSink, RunSummary,
};

/// A configured checker: job root, context, optional sink, and round schedule.
pub struct Checker {
    root: PathBuf,
    ctx: CheckerContext,
    sink: Option<Arc<dyn ResultSink>>,
    single: bool,
    interval: Duration,
}

impl Checker {
    /// Create a checker over the job directories under `root`.
    pub fn new(root: impl Into<PathBuf>, ctx: CheckerContext, sink: Option<Arc<dyn ResultSink>>) -> Self {
        Self {
            root: root.into(),
            ctx,
            sink,
            single: true,
            interval: Duration::from_secs(30 * 60),
        }
    }

    /// Repeat rounds every `interval` instead of stopping after one.
    #[must_use]
    pub const fn repeating(mut self, interval: Duration) -> Self {
        self.single = false;
        self.interval = interval;
        self
    }

    /// Result sink, if persistence is enabled.
    #[must_use]
    pub fn sink(&self) -> Option<&Arc<dyn ResultSink>> {
        self.sink.as_ref()
    }

    /// Enumerate, dispatch, and record every job once.
    ///
    /// # Errors
    ///
    /// Returns `CheckerError::Enumeration` if the root cannot be listed, or
    /// `CheckerError::Cancelled` if a termination signal arrives.
    pub async fn check_all_once(&self) -> Result<RunSummary, CheckerError> {
        self.check_all_once_with(None).await
    }

    /// Like [`Self::check_all_once`], streaming each report to `observer`.
    ///
    /// # Errors
    ///
    /// See [`Self::check_all_once`].
    pub async fn check_all_once_with(
        &self,
        observer: Option<UnboundedSender<JobReport>>,
    ) -> Result<RunSummary, CheckerError> {
        let jobs = enumerate_jobs(&self.root)?;
        let dispatcher = Dispatcher::new(self.ctx.next_run(), self.sink.clone());
        dispatcher.run_all(jobs, observer).await
    }

    /// Run rounds until a single round completes (single mode) or the run is cancelled.
    ///
    /// Round failures other than cancellation are logged and the loop continues.
    ///
    /// # Errors
    ///
    /// Returns the round's error in single mode.
    pub async fn run(&self) -> Result<(), CheckerError> {
        loop {
            match self.check_all_once().await {
                Ok(summary) => info!(
                    jobs = summary.reports.len(),
                    passed = summary.reports.iter().filter(|r| r.result.is_success()).count(),
                    elapsed = ?summary.elapsed,
                    "round complete"
                ),
                Err(CheckerError::Cancelled) => return Err(CheckerError::Cancelled),
                Err(err) if self.single => return Err(err),
                Err(err) => warn!(error = %err, "fatal error detected in round"),
            }

            if self.single {
                return Ok(());
            }

            info!(interval = ?self.interval, "waiting for next round");
            tokio::select! {
                () = self.ctx.cancel.cancelled() => return Err(CheckerError::Cancelled),
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
