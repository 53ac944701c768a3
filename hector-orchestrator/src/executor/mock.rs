//! Mock executor
//!
//! Sleeps briefly and flips a biased coin. Handy for driving the service
//! without a container runtime; the controller tests use scripted executors
//! instead so outcomes stay deterministic.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use hector_core::domain::{Job, ResultJob, Status};

use super::{Executor, ExecutorError};

pub struct MockExecutor {
    failure_probability: f64,
    delay: Duration,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            failure_probability: 0.5,
            delay: Duration::from_millis(50),
        }
    }

    /// Probability in `[0, 1]` that a job comes back as ERROR.
    pub fn with_failure_probability(failure_probability: f64) -> Self {
        Self {
            failure_probability,
            ..Self::new()
        }
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn execute_job(&self, job: &Job) -> Result<ResultJob, ExecutorError> {
        info!("Started {} job ({})", job.name, job.id);
        tokio::time::sleep(self.delay).await;
        info!("Finished {} job", job.name);

        if rand::random::<f64>() < self.failure_probability {
            Ok(ResultJob {
                id: job.id.clone(),
                name: job.name.clone(),
                logs: "File not found exception".to_string(),
                status: Status::Error,
            })
        } else {
            Ok(ResultJob {
                id: job.id.clone(),
                name: job.name.clone(),
                logs: "All right".to_string(),
                status: Status::Done,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_job() -> Job {
        Job {
            id: "job-1".to_string(),
            name: "A".to_string(),
            image: "hector/toy:1.0.0".to_string(),
            arguments: vec![],
            dependencies: vec![],
            required_files: vec![],
            output_files: vec![],
        }
    }

    #[tokio::test]
    async fn test_always_succeeds_at_zero_probability() {
        let executor = MockExecutor::with_failure_probability(0.0);
        let result = executor.execute_job(&toy_job()).await.unwrap();
        assert_eq!(result.status, Status::Done);
        assert_eq!(result.logs, "All right");
    }

    #[tokio::test]
    async fn test_always_fails_at_full_probability() {
        let executor = MockExecutor::with_failure_probability(1.0);
        let result = executor.execute_job(&toy_job()).await.unwrap();
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.logs, "File not found exception");
    }
}
