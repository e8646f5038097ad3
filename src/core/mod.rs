//! Core checker abstractions: jobs, attempts, controllers, and dispatch.

pub mod attempt;
pub mod context;
pub mod controller;
pub mod dispatcher;
pub mod enumerator;
pub mod error;
pub mod job;
pub mod sandbox;
pub mod sink;

pub use attempt::{AttemptReport, AttemptRunner};
pub use context::{CheckerContext, RunSettings};
pub use controller::{JobController, Preparation, BUILD_DESCRIPTOR, SOLVER_DIR};
pub use dispatcher::{Dispatcher, RunSummary};
pub use enumerator::enumerate_jobs;
pub use error::{AppResult, CheckerError};
pub use job::{AttemptOutcome, Job, JobId, JobReport, JobResult, Manifest};
pub use sandbox::{ExitReport, SandboxError, SandboxProcess, SandboxRunner, SandboxSpec};
pub use sink::{ResultRecord, ResultSink};
