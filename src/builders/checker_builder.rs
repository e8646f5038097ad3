//! Builds a [`Checker`] from a [`CheckerConfig`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{CheckerConfig, StoreBackendConfig};
use crate::core::{CheckerContext, CheckerError, ResultSink, SandboxRunner};
use crate::infra::sandbox::DockerSandbox;
use crate::infra::store::{InMemoryResultStore, JsonlResultStore};
use crate::runtime::Checker;

/// Build the result sink selected by `cfg`, or `None` when persistence is off.
///
/// # Errors
///
/// Returns `CheckerError::Config` if a file-backed store has no path.
pub fn build_sink(cfg: &CheckerConfig) -> Result<Option<Arc<dyn ResultSink>>, CheckerError> {
    if cfg.nodb {
        return Ok(None);
    }
    let sink: Arc<dyn ResultSink> = match cfg.store.backend {
        StoreBackendConfig::InMemory => Arc::new(InMemoryResultStore::new()),
        StoreBackendConfig::Jsonl => {
            let path = cfg
                .store
                .path
                .clone()
                .ok_or_else(|| CheckerError::Config("jsonl store requires a path".into()))?;
            Arc::new(JsonlResultStore::new(path))
        }
    };
    Ok(Some(sink))
}

/// Build a checker that runs jobs in containers through the configured runtime CLI.
///
/// # Errors
///
/// Returns `CheckerError::Config` if the configuration is invalid.
pub fn build_checker(cfg: &CheckerConfig, cancel: CancellationToken) -> Result<Checker, CheckerError> {
    let sandbox: Arc<dyn SandboxRunner> = Arc::new(DockerSandbox::new(cfg.docker.clone()));
    build_checker_with(cfg, sandbox, cancel)
}

/// Build a checker over an explicit sandbox backend.
///
/// # Errors
///
/// Returns `CheckerError::Config` if the configuration is invalid.
pub fn build_checker_with(
    cfg: &CheckerConfig,
    sandbox: Arc<dyn SandboxRunner>,
    cancel: CancellationToken,
) -> Result<Checker, CheckerError> {
    cfg.validate()
        .map_err(|e| CheckerError::Config(format!("config invalid: {e}")))?;

    let ctx = CheckerContext::new(cfg.run_settings(), sandbox, cancel);
    let sink = build_sink(cfg)?;
    let checker = Checker::new(cfg.challs.clone(), ctx, sink);
    Ok(if cfg.single {
        checker
    } else {
        checker.repeating(cfg.interval())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    #[test]
    fn test_nodb_disables_sink() {
        let cfg = CheckerConfig {
            nodb: true,
            ..CheckerConfig::default()
        };
        assert!(build_sink(&cfg).unwrap().is_none());
    }

    #[test]
    fn test_jsonl_without_path_is_config_error() {
        let cfg = CheckerConfig {
            store: StoreConfig {
                backend: StoreBackendConfig::Jsonl,
                path: None,
            },
            ..CheckerConfig::default()
        };
        assert!(matches!(build_sink(&cfg), Err(CheckerError::Config(_))));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let cfg = CheckerConfig {
            timeout: 0.0,
            ..CheckerConfig::default()
        };
        let err = build_checker(&cfg, CancellationToken::new()).err().unwrap();
        assert!(matches!(err, CheckerError::Config(_)));
    }
}
