//! Result sink abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::CheckerError;
use super::job::{JobId, JobReport, JobResult};

/// Immutable, append-only record of one job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Challenge identifier.
    pub job_id: JobId,
    /// Display name.
    pub name: String,
    /// Terminal result.
    pub result: JobResult,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl ResultRecord {
    /// Build a record from a report, or `None` when the report has no id.
    #[must_use]
    pub fn from_report(report: &JobReport, timestamp_ms: u64) -> Option<Self> {
        report.id.map(|job_id| Self {
            job_id,
            name: report.name.clone(),
            result: report.result,
            timestamp_ms,
        })
    }
}

/// Persistence for terminal results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Append a record.
    async fn record_result(&self, record: ResultRecord) -> Result<(), CheckerError>;

    /// Most recent records for `job_id`, newest first, at most `limit`.
    async fn fetch_latest(
        &self,
        job_id: JobId,
        limit: usize,
    ) -> Result<Vec<ResultRecord>, CheckerError>;
}
