//! Configuration models for the checker, its result store, and timeouts.

pub mod checker;

pub use checker::{CheckerConfig, StoreBackendConfig, StoreConfig};
