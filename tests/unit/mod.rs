//! Unit tests for individual components

mod badge_test;
mod config_test;
mod error_test;
