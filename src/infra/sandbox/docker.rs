//! Docker-compatible CLI sandbox.
//!
//! Each operation shells out to the configured runtime binary (`docker` by
//! default; anything CLI-compatible such as `podman` works):
//!
//! - build: `docker build -q -t <tag> <solver_dir>`
//! - launch: `docker run --name <container> --rm <image>`
//! - remove: `docker rm -f <container>`
//!
//! Killing the `docker run` client does not stop the container, so the
//! attempt runner always follows a kill with `remove`.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::core::{ExitReport, SandboxError, SandboxProcess, SandboxRunner, SandboxSpec};

/// Maximum stderr captured from a sandbox process (1 MiB).
const MAX_STDERR_BYTES: u64 = 1024 * 1024;

/// Sandbox backed by a Docker-compatible command-line runtime.
#[derive(Debug, Clone)]
pub struct DockerSandbox {
    binary: String,
}

impl DockerSandbox {
    /// Create a sandbox that invokes `binary`.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

impl Default for DockerSandbox {
    fn default() -> Self {
        Self::new("docker")
    }
}

/// A running `docker run` client process.
struct DockerProcess {
    child: Child,
    stderr: Option<JoinHandle<Vec<u8>>>,
}

#[async_trait]
impl SandboxProcess for DockerProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> Result<ExitReport, SandboxError> {
        let status = self.child.wait().await?;
        // The handle is cleared only once joined, so a dropped `wait` can be resumed.
        let stderr = match self.stderr.as_mut() {
            Some(handle) => {
                let bytes = handle.await.unwrap_or_default();
                self.stderr = None;
                bytes
            }
            None => Vec::new(),
        };
        Ok(ExitReport {
            code: status.code(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    async fn kill(&mut self) -> Result<(), SandboxError> {
        if matches!(self.child.try_wait(), Ok(Some(_))) {
            return Ok(());
        }
        self.child.kill().await?;
        if let Some(handle) = self.stderr.take() {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl SandboxRunner for DockerSandbox {
    async fn build(&self, spec: &SandboxSpec) -> Result<String, SandboxError> {
        let output = self
            .command()
            .args(["build", "-q", "-t", spec.image_tag.as_str()])
            .arg(&spec.solver_dir)
            .output()
            .await
            .map_err(SandboxError::Spawn)?;

        if !output.status.success() {
            return Err(SandboxError::Build {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let image = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!(job = %spec.job_name, image = %image, "image built");
        if image.is_empty() {
            Ok(spec.image_tag.clone())
        } else {
            Ok(image)
        }
    }

    async fn launch(
        &self,
        spec: &SandboxSpec,
        image: &str,
    ) -> Result<Box<dyn SandboxProcess>, SandboxError> {
        let mut child = self
            .command()
            .args(["run", "--name", spec.container_name.as_str(), "--rm", image])
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SandboxError::Spawn)?;

        let stderr = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(read_capped(pipe)));
        Ok(Box::new(DockerProcess { child, stderr }))
    }

    async fn remove(&self, container: &str) -> Result<(), SandboxError> {
        let output = self
            .command()
            .args(["rm", "-f", container])
            .output()
            .await
            .map_err(|err| SandboxError::Cleanup {
                container: container.to_string(),
                reason: err.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() || is_already_gone(&stderr) {
            Ok(())
        } else {
            Err(SandboxError::Cleanup {
                container: container.to_string(),
                reason: stderr.trim().to_string(),
            })
        }
    }
}

/// True when the runtime reports that the container no longer exists.
fn is_already_gone(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("no such container") || lower.contains("is already in progress")
}

async fn read_capped<R: AsyncRead + Unpin>(pipe: R) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = pipe.take(MAX_STDERR_BYTES).read_to_end(&mut buf).await;
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_already_gone_detection() {
        assert!(is_already_gone(
            "Error response from daemon: No such container: container_solver_1_1_abc"
        ));
        assert!(is_already_gone(
            "Error response from daemon: removal of container x is already in progress"
        ));
        assert!(!is_already_gone("Cannot connect to the Docker daemon"));
    }

    #[tokio::test]
    async fn test_missing_runtime_is_spawn_error() {
        let sandbox = DockerSandbox::new("/nonexistent/solve-checker-runtime");
        let spec = SandboxSpec {
            job_id: 1,
            job_name: "chall1".into(),
            solver_dir: std::env::temp_dir(),
            image_tag: "solver_1".into(),
            container_name: "container_solver_1_1_test".into(),
            attempt: 1,
        };
        let err = sandbox.build(&spec).await.unwrap_err();
        assert!(matches!(err, SandboxError::Spawn(_)));
        let err = sandbox.launch(&spec, "solver_1").await.err().unwrap();
        assert!(matches!(err, SandboxError::Spawn(_)));
        let err = sandbox.remove(&spec.container_name).await.unwrap_err();
        assert!(matches!(err, SandboxError::Cleanup { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_wait_resumes_after_drop_and_kill_after_exit_is_ok() {
        // `sh run ...` fails to open a script named `run` and reports it on stderr.
        let sandbox = DockerSandbox::new("sh");
        let spec = SandboxSpec {
            job_id: 2,
            job_name: "chall2".into(),
            solver_dir: std::env::temp_dir(),
            image_tag: "solver_2".into(),
            container_name: "container_solver_2_1_test".into(),
            attempt: 1,
        };
        let mut process = match sandbox.launch(&spec, "solver_2").await {
            Ok(process) => process,
            Err(err) => panic!("failed to start sh: {err}"),
        };

        // Abandon a wait mid-flight, as a lost select! branch would.
        let exit = match tokio::time::timeout(Duration::ZERO, process.wait()).await {
            Ok(finished) => finished.unwrap(),
            Err(_) => process.wait().await.unwrap(),
        };
        assert_ne!(exit.code, Some(0));
        assert!(!exit.stderr.is_empty());
        assert!(process.kill().await.is_ok());
    }
}
