//! Builders to construct checker components from configuration.

pub mod checker_builder;

pub use checker_builder::{build_checker, build_checker_with, build_sink};
