//! Checker runtime: round scheduling, signal handling, and status badges.

pub mod api;
pub mod badge;
pub mod shutdown;

pub use api::Checker;
pub use badge::{badge_url, Badge, ERROR_BADGE_URL};
pub use shutdown::spawn_signal_listener;
