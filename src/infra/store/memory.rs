//! In-memory result store.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{CheckerError, JobId, ResultRecord, ResultSink};

/// Simple in-memory result log for development/testing.
#[derive(Default)]
pub struct InMemoryResultStore {
    records: Mutex<Vec<ResultRecord>>,
}

impl InMemoryResultStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<ResultRecord> {
        self.records.lock().clone()
    }
}

/// Newest-first records of `job_id`, at most `limit`.
pub(crate) fn latest_of<'a>(
    records: impl IntoIterator<Item = &'a ResultRecord>,
    job_id: JobId,
    limit: usize,
) -> Vec<ResultRecord> {
    let mut matching: Vec<(usize, &ResultRecord)> = records
        .into_iter()
        .filter(|r| r.job_id == job_id)
        .enumerate()
        .collect();
    // Later insertions win ties on timestamp.
    matching.sort_by(|(ia, a), (ib, b)| {
        b.timestamp_ms.cmp(&a.timestamp_ms).then(ib.cmp(ia))
    });
    matching
        .into_iter()
        .take(limit)
        .map(|(_, r)| r.clone())
        .collect()
}

#[async_trait]
impl ResultSink for InMemoryResultStore {
    async fn record_result(&self, record: ResultRecord) -> Result<(), CheckerError> {
        self.records.lock().push(record);
        Ok(())
    }

    async fn fetch_latest(
        &self,
        job_id: JobId,
        limit: usize,
    ) -> Result<Vec<ResultRecord>, CheckerError> {
        Ok(latest_of(self.records.lock().iter(), job_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::JobResult;

    fn record(job_id: JobId, result: JobResult, timestamp_ms: u64) -> ResultRecord {
        ResultRecord {
            job_id,
            name: format!("chall{job_id}"),
            result,
            timestamp_ms,
        }
    }

    #[tokio::test]
    async fn test_fetch_latest_newest_first() {
        let store = InMemoryResultStore::new();
        store.record_result(record(1, JobResult::Failure, 100)).await.unwrap();
        store.record_result(record(2, JobResult::Success, 150)).await.unwrap();
        store.record_result(record(1, JobResult::Success, 200)).await.unwrap();
        store.record_result(record(1, JobResult::Timeout, 300)).await.unwrap();

        let latest = store.fetch_latest(1, 2).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].result, JobResult::Timeout);
        assert_eq!(latest[1].result, JobResult::Success);
    }

    #[tokio::test]
    async fn test_same_timestamp_prefers_latest_insert() {
        let store = InMemoryResultStore::new();
        store.record_result(record(1, JobResult::Failure, 100)).await.unwrap();
        store.record_result(record(1, JobResult::Success, 100)).await.unwrap();
        let latest = store.fetch_latest(1, 1).await.unwrap();
        assert_eq!(latest[0].result, JobResult::Success);
    }

    #[tokio::test]
    async fn test_fetch_unknown_and_zero_limit() {
        let store = InMemoryResultStore::new();
        store.record_result(record(1, JobResult::Success, 100)).await.unwrap();
        assert!(store.fetch_latest(999, 1).await.unwrap().is_empty());
        assert!(store.fetch_latest(1, 0).await.unwrap().is_empty());
        assert_eq!(store.records().len(), 1);
    }
}
