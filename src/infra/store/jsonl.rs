//! Append-only JSON-lines result store.
//!
//! One [`ResultRecord`] per line. Writes are serialized through an async
//! mutex so concurrent job completions never interleave partial lines.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::core::{CheckerError, JobId, ResultRecord, ResultSink};

use super::memory::latest_of;

/// File-backed result log.
pub struct JsonlResultStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlResultStore {
    /// Create a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<ResultRecord>, CheckerError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(persistence(&self.path, &err)),
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(CheckerError::from))
            .collect()
    }
}

fn persistence(path: &Path, err: &std::io::Error) -> CheckerError {
    CheckerError::Persistence(format!("{}: {err}", path.display()))
}

#[async_trait]
impl ResultSink for JsonlResultStore {
    async fn record_result(&self, record: ResultRecord) -> Result<(), CheckerError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| persistence(&self.path, &e))?;
        file.write_all(&line)
            .await
            .map_err(|e| persistence(&self.path, &e))?;
        file.flush().await.map_err(|e| persistence(&self.path, &e))
    }

    async fn fetch_latest(
        &self,
        job_id: JobId,
        limit: usize,
    ) -> Result<Vec<ResultRecord>, CheckerError> {
        let records = self.read_all().await?;
        Ok(latest_of(&records, job_id, limit))
    }
}
