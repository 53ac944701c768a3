//! Local container driver
//!
//! Runs a job through the local container daemon by driving the docker CLI
//! (or a compatible binary such as podman): pull the image if it is not
//! present, create and start the container with the serialized arguments,
//! wait for it to stop, then read stderr and stdout. A container that wrote
//! to stderr is reported as ERROR; success is an empty stderr, in which case
//! the logs carry stdout.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, warn};

use hector_core::domain::{Job, ResultJob, Status};

use super::{Executor, ExecutorError};

pub struct DockerExecutor {
    binary: String,
}

impl DockerExecutor {
    pub fn new() -> Self {
        Self::with_binary("docker")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run<I, S>(&self, args: I) -> Result<Output, ExecutorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Ok(Command::new(&self.binary).args(args).output().await?)
    }

    async fn image_available(&self, image: &str) -> Result<bool, ExecutorError> {
        let output = self.run(["image", "inspect", image]).await?;
        Ok(output.status.success())
    }

    async fn remove_container(&self, container_id: &str) {
        match self.run(["rm", "--force", container_id]).await {
            Ok(output) if !output.status.success() => {
                warn!(
                    "Failed to remove container {}: {}",
                    container_id,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(err) => warn!("Failed to remove container {}: {}", container_id, err),
            _ => {}
        }
    }
}

impl Default for DockerExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Argument vector of the `create` invocation: image first, then the job's
/// serialized parameters.
fn create_args(job: &Job) -> Vec<String> {
    let mut args = vec!["create".to_string(), job.image.clone()];
    args.extend(job.argument_vector());
    args
}

#[async_trait]
impl Executor for DockerExecutor {
    async fn execute_job(&self, job: &Job) -> Result<ResultJob, ExecutorError> {
        info!("Started {} job ({}) on image {}", job.name, job.id, job.image);

        let mut logs = String::new();

        // Pull the image when it is not present locally. A failed pull is a
        // job-level error: the outcome is known, the image cannot run.
        if !self.image_available(&job.image).await? {
            debug!("Image {} not present, pulling", job.image);
            let pull = self.run(["pull", &job.image]).await?;
            if !pull.status.success() {
                return Ok(ResultJob {
                    id: job.id.clone(),
                    name: job.name.clone(),
                    logs: String::from_utf8_lossy(&pull.stderr).into_owned(),
                    status: Status::Error,
                });
            }
            logs.push_str(&String::from_utf8_lossy(&pull.stdout));
            logs.push('\n');
        }

        let create = self.run(create_args(job)).await?;
        if !create.status.success() {
            return Err(ExecutorError::Runtime(format!(
                "failed to create container for image {}: {}",
                job.image,
                String::from_utf8_lossy(&create.stderr).trim()
            )));
        }
        let container_id = String::from_utf8_lossy(&create.stdout).trim().to_string();

        let start = self.run(["start", &container_id]).await?;
        if !start.status.success() {
            let message = format!(
                "failed to start container {}: {}",
                container_id,
                String::from_utf8_lossy(&start.stderr).trim()
            );
            self.remove_container(&container_id).await;
            return Err(ExecutorError::Runtime(message));
        }

        // Blocks until the container reaches a terminal state.
        let wait = self.run(["wait", &container_id]).await?;
        if !wait.status.success() {
            let message = format!(
                "failed to wait for container {}: {}",
                container_id,
                String::from_utf8_lossy(&wait.stderr).trim()
            );
            self.remove_container(&container_id).await;
            return Err(ExecutorError::Runtime(message));
        }

        // The CLI relays the container's stdout and stderr on its own
        // streams, so one logs call yields both channels separately.
        let channels = self.run(["logs", &container_id]).await?;
        self.remove_container(&container_id).await;
        if !channels.status.success() {
            return Err(ExecutorError::Runtime(format!(
                "failed to read logs of container {}: {}",
                container_id,
                String::from_utf8_lossy(&channels.stderr).trim()
            )));
        }

        info!("Finished {} job", job.name);

        let stderr = String::from_utf8_lossy(&channels.stderr);
        if !stderr.is_empty() {
            logs.push_str(&stderr);
            return Ok(ResultJob {
                id: job.id.clone(),
                name: job.name.clone(),
                logs,
                status: Status::Error,
            });
        }

        logs.push_str(&String::from_utf8_lossy(&channels.stdout));
        Ok(ResultJob {
            id: job.id.clone(),
            name: job.name.clone(),
            logs,
            status: Status::Done,
        })
    }
}
