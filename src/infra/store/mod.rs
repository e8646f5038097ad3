//! Result store backends.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlResultStore;
pub use memory::InMemoryResultStore;
