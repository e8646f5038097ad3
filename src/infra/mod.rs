//! Infrastructure adapters for sandboxes and result stores.

pub mod sandbox;
pub mod store;

pub use sandbox::{DockerSandbox, MockBehavior, MockSandbox};
pub use store::{InMemoryResultStore, JsonlResultStore};
