//! Shared fixtures: challenge directories on disk and mock-backed contexts.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use solve_checker::core::{CheckerContext, RunSettings};
use solve_checker::infra::sandbox::MockSandbox;

/// A temporary challenge root.
pub struct ChallengeRoot {
    dir: TempDir,
}

impl ChallengeRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Job with a manifest and `exploit/Dockerfile`.
    pub fn add_job(&self, dir_name: &str, id: u64) -> PathBuf {
        let job = self.add_manifest(dir_name, &manifest(dir_name, id, false, None));
        write_solver(&job.join("exploit"));
        job
    }

    /// Job with a manifest timeout override.
    pub fn add_job_with_timeout(&self, dir_name: &str, id: u64, timeout_secs: f64) -> PathBuf {
        let job = self.add_manifest(dir_name, &manifest(dir_name, id, false, Some(timeout_secs)));
        write_solver(&job.join("exploit"));
        job
    }

    /// Job with a manifest and no solver directory.
    pub fn add_job_without_solver(&self, dir_name: &str, id: u64, default_success: bool) -> PathBuf {
        self.add_manifest(dir_name, &manifest(dir_name, id, default_success, None))
    }

    /// Job directory with raw manifest text.
    pub fn add_manifest(&self, dir_name: &str, text: &str) -> PathBuf {
        let job = self.path().join(dir_name);
        fs::create_dir_all(&job).expect("Failed to create job dir");
        fs::write(job.join("info.json"), text).expect("Failed to write manifest");
        job
    }

    /// Job directory with no manifest at all.
    pub fn add_empty_dir(&self, dir_name: &str) -> PathBuf {
        let job = self.path().join(dir_name);
        fs::create_dir_all(&job).expect("Failed to create job dir");
        job
    }
}

pub fn manifest(name: &str, id: u64, default_success: bool, timeout: Option<f64>) -> String {
    let mut value = serde_json::json!({
        "name": name,
        "id": id,
        "default": default_success,
    });
    if let Some(timeout) = timeout {
        value["timeout"] = serde_json::json!(timeout);
    }
    value.to_string()
}

pub fn write_solver(dir: &Path) {
    fs::create_dir_all(dir).expect("Failed to create solver dir");
    fs::write(dir.join("Dockerfile"), "FROM alpine\nCMD [\"true\"]\n")
        .expect("Failed to write Dockerfile");
}

pub fn settings(parallelism: usize, max_retries: u32, default_timeout: Duration) -> RunSettings {
    RunSettings {
        manifest_file: "info.json".into(),
        default_timeout,
        max_retries,
        parallelism,
    }
}

pub fn context(mock: &MockSandbox, settings: RunSettings, cancel: CancellationToken) -> CheckerContext {
    CheckerContext::new(settings, Arc::new(mock.clone()), cancel)
}
