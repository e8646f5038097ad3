//! Tests for badge formatting

use solve_checker::core::{JobResult, ResultRecord};
use solve_checker::runtime::badge::{Badge, ERROR_BADGE_URL};

const HOUR_MS: u64 = 60 * 60 * 1000;

fn record(result: JobResult, timestamp_ms: u64) -> ResultRecord {
    ResultRecord {
        job_id: 1,
        name: "baby-rop".into(),
        result,
        timestamp_ms,
    }
}

#[test]
fn test_badge_from_record() {
    let badge = Badge::from_record(&record(JobResult::Timeout, 0), 2 * HOUR_MS);
    assert_eq!(badge.label, "Timeout");
    assert_eq!(badge.message, "2 hours ago");
    assert_eq!(badge.color, "6600CC");
}

#[test]
fn test_not_executed_badge_url() {
    let badge = Badge::from_record(&record(JobResult::NotExecuted, 0), 0);
    assert_eq!(
        badge.url(),
        "https://img.shields.io/badge/test not executed-just now-808080"
    );
}

#[test]
fn test_badge_url_escapes_separators() {
    let badge = Badge {
        label: "pre-release_1".into(),
        message: "1 day ago".into(),
        color: "CC0000".into(),
    };
    assert_eq!(
        badge.url(),
        "https://img.shields.io/badge/pre--release__1-1 day ago-CC0000"
    );
}

#[test]
fn test_future_timestamp_reads_just_now() {
    let badge = Badge::from_record(&record(JobResult::Success, 10_000), 5_000);
    assert_eq!(badge.message, "just now");
}

#[test]
fn test_error_badge_constant() {
    assert!(ERROR_BADGE_URL.starts_with("https://img.shields.io/badge/error-"));
}
