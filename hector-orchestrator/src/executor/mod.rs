//! Executor
//!
//! The pluggable backend that runs a single Job as a container and reports a
//! terminal ResultJob. A job that runs and fails is not an error here: it
//! comes back as a ResultJob with status ERROR and the container's stderr as
//! logs. `ExecutorError` is reserved for infrastructure failures where the
//! outcome of the job cannot be determined at all.

pub mod docker;
pub mod mock;
pub mod nomad;

pub use docker::DockerExecutor;
pub use mock::MockExecutor;
pub use nomad::NomadExecutor;

use async_trait::async_trait;
use thiserror::Error;

use hector_core::domain::{Job, ResultJob};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("container runtime failure: {0}")]
    Runtime(String),

    #[error("request to execution backend failed: {0}")]
    Backend(#[from] reqwest::Error),

    #[error("i/o failure while driving the container runtime: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs one job to a terminal state.
///
/// Implementations must be thread-safe and reentrant: the controller issues
/// concurrent `execute_job` calls for every job of a layer.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute_job(&self, job: &Job) -> Result<ResultJob, ExecutorError>;
}
