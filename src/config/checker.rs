//! Checker configuration structures.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::RunSettings;

/// Result store backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// In-memory store (lost on exit).
    #[default]
    InMemory,
    /// Append-only JSON-lines file.
    Jsonl,
}

/// Result store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StoreBackendConfig,
    /// File path for file-backed stores.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Root checker configuration. Field names follow the checker's JSON config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Run the job set once and exit.
    pub single: bool,
    /// Run jobs in parallel.
    pub parallel: bool,
    /// Parallel slot count; 0 means one slot when `parallel` is set.
    pub pnum: usize,
    /// Default attempt timeout in seconds.
    pub timeout: f64,
    /// Manifest file name inside each job directory.
    pub infofile: String,
    /// Disable result persistence.
    pub nodb: bool,
    /// Root directory holding one subdirectory per job.
    pub challs: PathBuf,
    /// Minutes between rounds when not `single`.
    pub interval: u64,
    /// Retries allowed beyond the first attempt.
    pub retries: u32,
    /// Container runtime CLI.
    pub docker: String,
    /// Result store.
    pub store: StoreConfig,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            single: false,
            parallel: true,
            pnum: 0,
            timeout: 10.0,
            infofile: "info.json".into(),
            nodb: false,
            challs: PathBuf::from("challs"),
            interval: 30,
            retries: 0,
            docker: "docker".into(),
            store: StoreConfig::default(),
        }
    }
}

impl CheckerConfig {
    /// Normalize settings that imply one another.
    pub fn resolve_conflict(&mut self) {
        if self.pnum >= 1 {
            self.parallel = true;
        }
        if self.parallel && self.pnum == 0 {
            self.pnum = 1;
        }
        if self.interval == 0 {
            self.interval = 1;
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err("timeout must be a positive number of seconds".into());
        }
        if self.infofile.trim().is_empty() {
            return Err("infofile must not be empty".into());
        }
        if self.docker.trim().is_empty() {
            return Err("docker must name a container runtime binary".into());
        }
        if !self.nodb && self.store.backend == StoreBackendConfig::Jsonl && self.store.path.is_none()
        {
            return Err("jsonl store requires a path".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string, resolve, and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let mut cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.resolve_conflict();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a read, parse, or validation message.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Number of jobs allowed to run at once.
    #[must_use]
    pub fn parallelism(&self) -> usize {
        if self.parallel {
            self.pnum.max(1)
        } else {
            1
        }
    }

    /// Default attempt timeout.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::from_secs(10))
    }

    /// Interval between rounds.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.saturating_mul(60))
    }

    /// Settings shared by every job of a run.
    #[must_use]
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            manifest_file: self.infofile.clone(),
            default_timeout: self.default_timeout(),
            max_retries: self.retries,
            parallelism: self.parallelism(),
        }
    }
}
