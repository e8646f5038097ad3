//! Deterministic scripted sandbox for development and tests.
//!
//! Behavior is scripted per job id and consumed one entry per attempt; the
//! last entry repeats once the script is exhausted. Every build, launch,
//! kill, and removal is recorded so tests can check attempt counts,
//! concurrency, ordering, and leaked containers.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{ExitReport, JobId, SandboxError, SandboxProcess, SandboxRunner, SandboxSpec};

/// Scripted behavior for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Exit with `code` after `after`.
    Exit {
        /// Exit status.
        code: i32,
        /// Simulated run time.
        after: Duration,
    },
    /// Never exit on its own.
    Hang,
    /// Fail to start the container process.
    FailToSpawn,
    /// Fail the image build.
    FailToBuild,
    /// Spend this long building the image, then exit 0 when run.
    SlowBuild(Duration),
}

impl MockBehavior {
    /// Exit 0 immediately.
    #[must_use]
    pub const fn succeed() -> Self {
        Self::Exit {
            code: 0,
            after: Duration::ZERO,
        }
    }

    /// Exit with `code` immediately.
    #[must_use]
    pub const fn exit(code: i32) -> Self {
        Self::Exit {
            code,
            after: Duration::ZERO,
        }
    }
}

/// Something the mock sandbox observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxEvent {
    /// A container was launched.
    Launched {
        /// Job id.
        job_id: JobId,
        /// Container name.
        container: String,
        /// Launch time.
        at: Instant,
    },
    /// A container process exited on its own.
    Exited {
        /// Job id.
        job_id: JobId,
        /// Exit status.
        code: i32,
    },
    /// A container process was force-killed.
    Killed {
        /// Container name.
        container: String,
    },
    /// Removal of a container was refused.
    RemoveFailed {
        /// Container name.
        container: String,
    },
    /// A container was removed.
    Removed {
        /// Container name.
        container: String,
        /// Whether it still existed.
        existed: bool,
    },
}

#[derive(Default)]
struct MockState {
    scripts: HashMap<JobId, VecDeque<MockBehavior>>,
    pending: HashMap<String, MockBehavior>,
    attempts: HashMap<JobId, u32>,
    live: BTreeSet<String>,
    max_live: usize,
    events: Vec<SandboxEvent>,
    failing_remove: bool,
}

/// Scripted sandbox. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct MockSandbox {
    default: MockBehavior,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockSandbox {
    fn default() -> Self {
        Self::new(MockBehavior::succeed())
    }
}

impl MockSandbox {
    /// Create a sandbox whose unscripted jobs behave as `default`.
    #[must_use]
    pub fn new(default: MockBehavior) -> Self {
        Self {
            default,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Script per-attempt behavior for `job_id`.
    #[must_use]
    pub fn with_script(self, job_id: JobId, behaviors: Vec<MockBehavior>) -> Self {
        self.state.lock().scripts.insert(job_id, behaviors.into());
        self
    }

    /// Make every `remove` call fail. The container stays live.
    #[must_use]
    pub fn with_failing_remove(self) -> Self {
        self.state.lock().failing_remove = true;
        self
    }

    /// Attempts (image builds) performed for `job_id`.
    #[must_use]
    pub fn attempts(&self, job_id: JobId) -> u32 {
        self.state.lock().attempts.get(&job_id).copied().unwrap_or(0)
    }

    /// Containers launched but not yet removed.
    #[must_use]
    pub fn live_containers(&self) -> Vec<String> {
        self.state.lock().live.iter().cloned().collect()
    }

    /// Highest number of simultaneously live containers.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.state.lock().max_live
    }

    /// All recorded events in order.
    #[must_use]
    pub fn events(&self) -> Vec<SandboxEvent> {
        self.state.lock().events.clone()
    }

    /// Launch times of `job_id`'s containers.
    #[must_use]
    pub fn launch_times(&self, job_id: JobId) -> Vec<Instant> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                SandboxEvent::Launched { job_id: id, at, .. } if *id == job_id => Some(*at),
                _ => None,
            })
            .collect()
    }

    fn next_behavior(&self, job_id: JobId) -> MockBehavior {
        let mut state = self.state.lock();
        *state.attempts.entry(job_id).or_default() += 1;
        match state.scripts.get_mut(&job_id) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or_else(|| self.default.clone()),
            Some(script) => script.front().cloned().unwrap_or_else(|| self.default.clone()),
            None => self.default.clone(),
        }
    }
}

struct MockProcess {
    job_id: JobId,
    container: String,
    behavior: MockBehavior,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl SandboxProcess for MockProcess {
    fn pid(&self) -> Option<u32> {
        None
    }

    async fn wait(&mut self) -> Result<ExitReport, SandboxError> {
        match self.behavior {
            MockBehavior::Exit { code, after } => {
                tokio::time::sleep(after).await;
                self.state.lock().events.push(SandboxEvent::Exited {
                    job_id: self.job_id,
                    code,
                });
                Ok(ExitReport {
                    code: Some(code),
                    stderr: if code == 0 {
                        String::new()
                    } else {
                        format!("solver exited with status {code}")
                    },
                })
            }
            _ => std::future::pending().await,
        }
    }

    async fn kill(&mut self) -> Result<(), SandboxError> {
        self.state.lock().events.push(SandboxEvent::Killed {
            container: self.container.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl SandboxRunner for MockSandbox {
    async fn build(&self, spec: &SandboxSpec) -> Result<String, SandboxError> {
        let mut behavior = self.next_behavior(spec.job_id);
        match behavior {
            MockBehavior::FailToBuild => {
                return Err(SandboxError::Build {
                    status: Some(1),
                    stderr: "scripted build failure".into(),
                });
            }
            MockBehavior::SlowBuild(delay) => {
                tokio::time::sleep(delay).await;
                behavior = MockBehavior::succeed();
            }
            _ => {}
        }
        self.state
            .lock()
            .pending
            .insert(spec.container_name.clone(), behavior);
        Ok(spec.image_tag.clone())
    }

    async fn launch(
        &self,
        spec: &SandboxSpec,
        _image: &str,
    ) -> Result<Box<dyn SandboxProcess>, SandboxError> {
        let mut state = self.state.lock();
        let behavior = state
            .pending
            .remove(&spec.container_name)
            .unwrap_or_else(|| self.default.clone());
        if behavior == MockBehavior::FailToSpawn {
            return Err(SandboxError::Spawn(io::Error::new(
                io::ErrorKind::NotFound,
                "scripted spawn failure",
            )));
        }

        state.live.insert(spec.container_name.clone());
        state.max_live = state.max_live.max(state.live.len());
        state.events.push(SandboxEvent::Launched {
            job_id: spec.job_id,
            container: spec.container_name.clone(),
            at: Instant::now(),
        });
        drop(state);

        Ok(Box::new(MockProcess {
            job_id: spec.job_id,
            container: spec.container_name.clone(),
            behavior,
            state: Arc::clone(&self.state),
        }))
    }

    async fn remove(&self, container: &str) -> Result<(), SandboxError> {
        let mut state = self.state.lock();
        if state.failing_remove {
            state.events.push(SandboxEvent::RemoveFailed {
                container: container.to_string(),
            });
            return Err(SandboxError::Cleanup {
                container: container.to_string(),
                reason: "scripted removal failure".into(),
            });
        }
        let existed = state.live.remove(container);
        state.events.push(SandboxEvent::Removed {
            container: container.to_string(),
            existed,
        });
        Ok(())
    }
}
