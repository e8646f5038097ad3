//! Tests for configuration parsing and validation

use std::time::Duration;

use solve_checker::config::{CheckerConfig, StoreBackendConfig};

#[test]
fn test_defaults() {
    let cfg = CheckerConfig::default();
    assert_eq!(cfg.infofile, "info.json");
    assert_eq!(cfg.default_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.interval(), Duration::from_secs(30 * 60));
    assert_eq!(cfg.docker, "docker");
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_from_json_str_applies_fields() {
    let cfg = CheckerConfig::from_json_str(
        r#"{
            "single": true,
            "parallel": false,
            "pnum": 0,
            "timeout": 2.5,
            "infofile": "challenge.json",
            "nodb": true,
            "challs": "/srv/challs",
            "retries": 2
        }"#,
    )
    .expect("Failed to parse config");

    assert!(cfg.single);
    assert_eq!(cfg.parallelism(), 1);
    assert_eq!(cfg.default_timeout(), Duration::from_millis(2500));

    let settings = cfg.run_settings();
    assert_eq!(settings.manifest_file, "challenge.json");
    assert_eq!(settings.max_retries, 2);
    assert_eq!(settings.parallelism, 1);
}

#[test]
fn test_pnum_forces_parallel() {
    let cfg = CheckerConfig::from_json_str(r#"{"parallel": false, "pnum": 4}"#)
        .expect("Failed to parse config");
    assert!(cfg.parallel);
    assert_eq!(cfg.parallelism(), 4);
}

#[test]
fn test_zero_interval_becomes_one_minute() {
    let cfg = CheckerConfig::from_json_str(r#"{"interval": 0}"#).expect("Failed to parse config");
    assert_eq!(cfg.interval(), Duration::from_secs(60));
}

#[test]
fn test_invalid_timeout_rejected() {
    assert!(CheckerConfig::from_json_str(r#"{"timeout": 0}"#).is_err());
    assert!(CheckerConfig::from_json_str(r#"{"timeout": -3.0}"#).is_err());
}

#[test]
fn test_jsonl_store_requires_path() {
    assert!(CheckerConfig::from_json_str(r#"{"store": {"backend": "jsonl"}}"#).is_err());

    let cfg = CheckerConfig::from_json_str(
        r#"{"store": {"backend": "jsonl", "path": "/var/lib/checker/results.jsonl"}}"#,
    )
    .expect("Failed to parse config");
    assert_eq!(cfg.store.backend, StoreBackendConfig::Jsonl);

    // Persistence disabled: the missing path does not matter.
    assert!(CheckerConfig::from_json_str(r#"{"nodb": true, "store": {"backend": "jsonl"}}"#).is_ok());
}

#[test]
fn test_from_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("checker.json");
    std::fs::write(&path, r#"{"retries": 3}"#).expect("Failed to write config");

    let cfg = CheckerConfig::from_file(&path).expect("Failed to load config");
    assert_eq!(cfg.retries, 3);

    assert!(CheckerConfig::from_file(&dir.path().join("missing.json")).is_err());
}
