//! # Solve Checker
//!
//! Periodically verifies that reference solvers for CTF challenges still work.
//!
//! Every subdirectory of a challenge root is one *job*: a manifest (`info.json`)
//! plus an `exploit/` directory holding a container build descriptor. The checker
//! builds and runs each solver in a disposable container, races the process
//! against a per-attempt deadline and process-wide cancellation, removes the
//! container on every path, retries failures, and forwards one terminal result
//! per job to a result sink.
//!
//! ## Layers
//!
//! - [`core`]: jobs, the attempt race, the per-job controller, and the bounded dispatcher.
//! - [`infra`]: the container CLI sandbox, a scripted mock sandbox, and result stores.
//! - [`config`] / [`builders`]: JSON configuration and assembly of a [`runtime::Checker`].
//! - [`runtime`]: the round loop, signal handling, and status badges.
//!
//! ```rust,ignore
//! use solve_checker::builders::build_checker;
//! use solve_checker::config::CheckerConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! let cfg = CheckerConfig::from_file("checker.json".as_ref())?;
//! let cancel = CancellationToken::new();
//! solve_checker::runtime::spawn_signal_listener(cancel.clone());
//! let checker = build_checker(&cfg, cancel)?;
//! let summary = checker.check_all_once().await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core checker abstractions: jobs, attempts, controllers, and dispatch.
pub mod core;
/// Configuration models for the checker and its result store.
pub mod config;
/// Builders to construct a checker from configuration.
pub mod builders;
/// Infrastructure adapters for sandboxes and result stores.
pub mod infra;
/// Round scheduling, signal handling, and badge formatting.
pub mod runtime;
/// Shared utilities.
pub mod util;
