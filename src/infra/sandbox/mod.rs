//! Sandbox backends.

pub mod docker;
pub mod mock;

pub use docker::DockerSandbox;
pub use mock::{MockBehavior, MockSandbox, SandboxEvent};
