//! Tests for error types

use solve_checker::core::{CheckerError, SandboxError};

#[test]
fn test_not_found_error() {
    let err = CheckerError::NotFound(7);
    assert_eq!(format!("{}", err), "no result recorded for job 7");
}

#[test]
fn test_cancelled_error() {
    let err = CheckerError::Cancelled;
    assert_eq!(format!("{}", err), "run cancelled by termination signal");
}

#[test]
fn test_persistence_error() {
    let err = CheckerError::Persistence("disk full".to_string());
    assert_eq!(format!("{}", err), "persistence error: disk full");
}

#[test]
fn test_sandbox_error_is_transparent() {
    let err: CheckerError = SandboxError::Cleanup {
        container: "container_solver_1_1_abcd1234".into(),
        reason: "daemon unavailable".into(),
    }
    .into();
    assert_eq!(
        format!("{}", err),
        "failed to remove container container_solver_1_1_abcd1234: daemon unavailable"
    );
}

#[test]
fn test_json_error_becomes_persistence() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: CheckerError = json_err.into();
    assert!(matches!(err, CheckerError::Persistence(_)));
}
