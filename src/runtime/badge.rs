//! Status badge formatting for shields.io.
//!
//! `https://img.shields.io/badge/<LABEL>-<MESSAGE>-<COLOR>`

use serde::{Deserialize, Serialize};

use crate::core::{CheckerError, JobId, ResultRecord, ResultSink};

/// Badge shown when the status itself cannot be fetched.
pub const ERROR_BADGE_URL: &str = "https://img.shields.io/badge/error-status_fetching_fails-red";

const SHIELDS_BASE: &str = "https://img.shields.io/badge";

/// Badge content for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    /// Left-hand text.
    pub label: String,
    /// Right-hand text.
    pub message: String,
    /// Hex color without `#`.
    pub color: String,
}

impl Badge {
    /// Badge for a stored record, aged relative to `now_ms`.
    #[must_use]
    pub fn from_record(record: &ResultRecord, now_ms: u64) -> Self {
        Self {
            label: record.result.message().to_string(),
            message: time_ago(now_ms.saturating_sub(record.timestamp_ms)),
            color: record.result.color().to_string(),
        }
    }

    /// shields.io URL for this badge.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{SHIELDS_BASE}/{}-{}-{}",
            shields_escape(&self.label),
            shields_escape(&self.message),
            self.color
        )
    }
}

/// Escape shields.io separators: `-` becomes `--`, `_` becomes `__`.
#[must_use]
pub fn shields_escape(s: &str) -> String {
    s.replace('-', "--").replace('_', "__")
}

/// English relative age of something `elapsed_ms` old.
#[must_use]
pub fn time_ago(elapsed_ms: u64) -> String {
    const MINUTE: u64 = 60 * 1000;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let (n, unit) = match elapsed_ms {
        ms if ms < MINUTE => return "just now".into(),
        ms if ms < HOUR => (ms / MINUTE, "minute"),
        ms if ms < DAY => (ms / HOUR, "hour"),
        ms => (ms / DAY, "day"),
    };
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Badge URL for the latest recorded result of `job_id`.
///
/// # Errors
///
/// Returns `CheckerError::NotFound` when nothing is recorded, or the sink's error.
pub async fn badge_url(
    sink: &dyn ResultSink,
    job_id: JobId,
    now_ms: u64,
) -> Result<String, CheckerError> {
    let latest = sink.fetch_latest(job_id, 1).await?;
    let record = latest.first().ok_or(CheckerError::NotFound(job_id))?;
    Ok(Badge::from_record(record, now_ms).url())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_ago() {
        assert_eq!(time_ago(5_000), "just now");
        assert_eq!(time_ago(60_000), "1 minute ago");
        assert_eq!(time_ago(5 * 60_000), "5 minutes ago");
        assert_eq!(time_ago(3 * 3_600_000), "3 hours ago");
        assert_eq!(time_ago(2 * 86_400_000), "2 days ago");
    }

    #[test]
    fn test_shields_escape() {
        assert_eq!(shields_escape("test not-executed_x"), "test not--executed__x");
    }
}
