//! `solve-checker` command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use solve_checker::builders::build_checker;
use solve_checker::config::{CheckerConfig, StoreBackendConfig};
use solve_checker::core::{AppResult, CheckerError, JobId, ResultSink};
use solve_checker::infra::store::JsonlResultStore;
use solve_checker::runtime::{badge_url, spawn_signal_listener, ERROR_BADGE_URL};
use solve_checker::util::{init_tracing, now_ms};

const STORE_PATH_ENV: &str = "CHECKER_STORE_PATH";

#[derive(Parser, Debug)]
#[command(name = "solve-checker", version, about = "Periodic sandboxed CTF solver checker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the checker over every challenge directory.
    Run(RunArgs),
    /// Print the status badge URL for a challenge.
    Badge {
        /// Challenge id.
        id: JobId,
        /// JSON-lines result store.
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Default attempt timeout in seconds.
    #[arg(long)]
    timeout: Option<f64>,
    /// Run once and exit.
    #[arg(long)]
    single: bool,
    /// Run challenges in parallel (`--parallel=false` to disable).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    parallel: Option<bool>,
    /// Number of parallel slots.
    #[arg(long)]
    pnum: Option<usize>,
    /// Manifest file name.
    #[arg(long)]
    infofile: Option<String>,
    /// Disable result persistence.
    #[arg(long)]
    nodb: bool,
    /// Challenge root directory.
    #[arg(long)]
    challs: Option<PathBuf>,
    /// Minutes between rounds.
    #[arg(long)]
    interval: Option<u64>,
    /// Retries after the first attempt.
    #[arg(long = "retry")]
    retries: Option<u32>,
    /// JSON-lines result store.
    #[arg(long)]
    store: Option<PathBuf>,
}

impl RunArgs {
    fn into_config(self) -> AppResult<CheckerConfig> {
        let mut cfg = match &self.config {
            Some(path) => CheckerConfig::from_file(path).map_err(anyhow::Error::msg)?,
            None => CheckerConfig::default(),
        };

        if let Ok(path) = std::env::var(STORE_PATH_ENV) {
            cfg.store.backend = StoreBackendConfig::Jsonl;
            cfg.store.path = Some(PathBuf::from(path));
        }

        if let Some(timeout) = self.timeout {
            cfg.timeout = timeout;
        }
        cfg.single |= self.single;
        if let Some(parallel) = self.parallel {
            cfg.parallel = parallel;
        }
        cfg.nodb |= self.nodb;
        if let Some(pnum) = self.pnum {
            cfg.pnum = pnum;
        }
        if let Some(infofile) = self.infofile {
            cfg.infofile = infofile;
        }
        if let Some(challs) = self.challs {
            cfg.challs = challs;
        }
        if let Some(interval) = self.interval {
            cfg.interval = interval;
        }
        if let Some(retries) = self.retries {
            cfg.retries = retries;
        }
        if let Some(store) = self.store {
            cfg.store.backend = StoreBackendConfig::Jsonl;
            cfg.store.path = Some(store);
        }

        cfg.resolve_conflict();
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

async fn run(args: RunArgs) -> AppResult<()> {
    let cfg = args.into_config().context("invalid checker configuration")?;
    info!(
        challs = %cfg.challs.display(),
        parallelism = cfg.parallelism(),
        timeout_secs = cfg.timeout,
        retries = cfg.retries,
        single = cfg.single,
        "starting checker"
    );

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());
    let checker = build_checker(&cfg, cancel)?;

    match checker.run().await {
        Ok(()) => Ok(()),
        Err(CheckerError::Cancelled) => {
            info!("checker stopped by signal");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn badge(id: JobId, store: Option<PathBuf>) -> AppResult<()> {
    let path = store
        .or_else(|| std::env::var(STORE_PATH_ENV).ok().map(PathBuf::from))
        .context("no result store given (use --store or CHECKER_STORE_PATH)")?;
    let sink = JsonlResultStore::new(path);
    let sink: &dyn ResultSink = &sink;

    match badge_url(sink, id, now_ms()).await {
        Ok(url) => println!("{url}"),
        Err(err) => {
            warn!(job_id = id, error = %err, "status fetching failed");
            println!("{ERROR_BADGE_URL}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing("info");

    match Cli::parse().command {
        Command::Run(args) => run(args).await,
        Command::Badge { id, store } => badge(id, store).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args,
            Command::Badge { .. } => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn test_parallel_flag_forms() {
        assert_eq!(run_args(&["solve-checker", "run"]).parallel, None);
        assert_eq!(run_args(&["solve-checker", "run", "--parallel"]).parallel, Some(true));
        assert_eq!(
            run_args(&["solve-checker", "run", "--parallel=false"]).parallel,
            Some(false)
        );
    }

    #[test]
    fn test_parallel_false_runs_sequentially() {
        let cfg = run_args(&["solve-checker", "run", "--parallel=false", "--nodb"])
            .into_config()
            .unwrap();
        assert!(!cfg.parallel);
        assert_eq!(cfg.parallelism(), 1);
    }
}
