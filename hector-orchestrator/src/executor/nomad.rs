//! Cluster batch driver
//!
//! Submits each job to a Nomad cluster as a one-shot batch job (one task
//! group, one docker-driver main task, no restart or reschedule attempts),
//! polls the job summary until the group completes or fails, reads the
//! relevant log channel and deregisters the job before returning. When the
//! job lists files to stage, download/upload sidecar tasks run around the
//! main task and their logs wrap the main output.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hector_core::domain::{Job, ResultJob, Status};

use crate::config::ObjectStoreConfig;

use super::{Executor, ExecutorError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DOWNLOAD_TASK: &str = "download-task";
const UPLOAD_TASK: &str = "upload-task";
/// Scratch volume shared between the main task and the staging sidecars.
const DATA_VOLUME: &str = "../alloc:/usr/local/src/data";

pub struct NomadExecutor {
    base_url: String,
    client: reqwest::Client,
    sidecar_image: String,
    object_store: ObjectStoreConfig,
}

impl NomadExecutor {
    pub fn new(
        base_url: impl Into<String>,
        sidecar_image: impl Into<String>,
        object_store: ObjectStoreConfig,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            sidecar_image: sidecar_image.into(),
            object_store,
        }
    }

    fn sidecar_env(&self) -> HashMap<String, String> {
        HashMap::from([
            ("MINIO_ENDPOINT".to_string(), self.object_store.endpoint.clone()),
            (
                "MINIO_ACCESS_KEY_ID".to_string(),
                self.object_store.access_key_id.clone(),
            ),
            (
                "MINIO_SECRET_ACCESS_KEY".to_string(),
                self.object_store.secret_access_key.clone(),
            ),
            ("MINIO_USE_SSL".to_string(), self.object_store.use_ssl.clone()),
            (
                "MINIO_BUCKET_NAME".to_string(),
                self.object_store.bucket_name.clone(),
            ),
        ])
    }

    fn staging_task(&self, name: &'static str, hook: &'static str, mode: &str, files: &[String]) -> NomadTask {
        let mut args = vec![mode.to_string()];
        for path in files {
            let base = path.rsplit('/').next().unwrap_or(path);
            args.push("--local-path".to_string());
            args.push(format!("data/{base}"));
            args.push("--remote-path".to_string());
            args.push(path.clone());
        }

        NomadTask {
            name: name.to_string(),
            driver: "docker",
            config: TaskConfig {
                image: self.sidecar_image.clone(),
                args,
                volumes: vec![DATA_VOLUME.to_string()],
            },
            env: Some(self.sidecar_env()),
            lifecycle: Some(Lifecycle {
                hook,
                sidecar: false,
            }),
            restart_policy: RestartPolicy { attempts: 0 },
        }
    }

    /// Builds the Nomad job payload for one hector job.
    fn build_job(&self, job: &Job, task_name: &str, group_name: &str) -> RegisterRequest {
        let main_task = NomadTask {
            name: task_name.to_string(),
            driver: "docker",
            config: TaskConfig {
                image: job.image.clone(),
                args: job.argument_vector(),
                volumes: vec![DATA_VOLUME.to_string()],
            },
            env: None,
            lifecycle: None,
            restart_policy: RestartPolicy { attempts: 0 },
        };

        let mut tasks = Vec::new();
        if !job.required_files.is_empty() {
            tasks.push(self.staging_task(DOWNLOAD_TASK, "prestart", "download", &job.required_files));
        }
        tasks.push(main_task);
        if !job.output_files.is_empty() {
            tasks.push(self.staging_task(UPLOAD_TASK, "poststop", "upload", &job.output_files));
        }

        RegisterRequest {
            job: NomadJob {
                id: job.id.clone(),
                name: job.name.clone(),
                job_type: "batch",
                datacenters: vec!["dc1".to_string()],
                task_groups: vec![TaskGroup {
                    name: group_name.to_string(),
                    tasks,
                    restart_policy: RestartPolicy { attempts: 0 },
                }],
                reschedule: ReschedulePolicy { attempts: 0 },
            },
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ExecutorError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExecutorError::Runtime(format!(
                "nomad API {path} returned {status}"
            )));
        }
        Ok(response.json().await?)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<String, ExecutorError> {
        let response = self
            .client
            .put(format!("{}/v1/jobs", self.base_url))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExecutorError::Runtime(format!(
                "nomad job registration returned {status}"
            )));
        }
        let body: RegisterResponse = response.json().await?;
        Ok(body.warnings)
    }

    async fn deregister(&self, job_id: &str) {
        let result = self
            .client
            .delete(format!("{}/v1/job/{}?purge=true", self.base_url, job_id))
            .send()
            .await;
        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(
                    "Failed to deregister nomad job {}: {}",
                    job_id,
                    response.status()
                );
            }
            Err(err) => warn!("Failed to deregister nomad job {}: {}", job_id, err),
            _ => {}
        }
    }

    /// Polls the job summary until the task group reports a terminal count.
    async fn wait_for_job(&self, job_id: &str, group_name: &str) -> Result<Status, ExecutorError> {
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let summary: JobSummaryResponse =
                self.get_json(&format!("/v1/job/{job_id}/summary")).await?;
            let group = summary.summary.get(group_name).cloned().unwrap_or_default();
            if group.complete == 1 {
                return Ok(Status::Done);
            }
            if group.failed == 1 {
                return Ok(Status::Error);
            }
        }
    }

    /// The single allocation produced by a one-group batch job.
    async fn allocation(&self, job_id: &str) -> Result<Allocation, ExecutorError> {
        let stubs: Vec<AllocationStub> =
            self.get_json(&format!("/v1/job/{job_id}/allocations")).await?;
        if stubs.len() != 1 {
            return Err(ExecutorError::Runtime(format!(
                "unexpected number of allocations for job {job_id}: {}",
                stubs.len()
            )));
        }
        self.get_json(&format!("/v1/allocation/{}", stubs[0].id)).await
    }

    /// Reads one log channel of one task; stdout for DONE, stderr otherwise.
    async fn task_logs(
        &self,
        alloc_id: &str,
        task: &str,
        status: Status,
    ) -> Result<String, ExecutorError> {
        let channel = if status == Status::Done { "stdout" } else { "stderr" };
        let response = self
            .client
            .get(format!("{}/v1/client/fs/logs/{alloc_id}", self.base_url))
            .query(&[
                ("task", task),
                ("type", channel),
                ("origin", "start"),
                ("offset", "0"),
                ("plain", "true"),
            ])
            .send()
            .await?;
        let http_status = response.status();
        if !http_status.is_success() {
            return Err(ExecutorError::Runtime(format!(
                "nomad log fetch for task {task} returned {http_status}"
            )));
        }
        Ok(response.text().await?)
    }

    async fn run_registered(
        &self,
        job: &Job,
        task_name: &str,
        group_name: &str,
        warnings: String,
    ) -> Result<ResultJob, ExecutorError> {
        let status = self.wait_for_job(&job.id, group_name).await?;
        info!("Finished {} job", job.name);

        let allocation = self.allocation(&job.id).await?;

        // A driver failure (e.g. the image could not be loaded) leaves no
        // container output worth reading; report the event message instead.
        if status == Status::Error {
            if let Some(event) = allocation
                .task_states
                .get(task_name)
                .into_iter()
                .flat_map(|state| state.events.iter())
                .find(|event| event.event_type == "Driver Failure")
            {
                return Ok(ResultJob {
                    id: job.id.clone(),
                    name: job.name.clone(),
                    logs: event.display_message.clone(),
                    status,
                });
            }
        }

        let alloc_id = &allocation.id;
        let mut logs = warnings;
        if !job.required_files.is_empty() {
            logs.push_str(&self.task_logs(alloc_id, DOWNLOAD_TASK, status).await?);
        }
        logs.push_str(&self.task_logs(alloc_id, task_name, status).await?);
        if !job.output_files.is_empty() {
            logs.push_str(&self.task_logs(alloc_id, UPLOAD_TASK, status).await?);
        }

        Ok(ResultJob {
            id: job.id.clone(),
            name: job.name.clone(),
            logs,
            status,
        })
    }
}

#[async_trait]
impl Executor for NomadExecutor {
    async fn execute_job(&self, job: &Job) -> Result<ResultJob, ExecutorError> {
        info!("Started {} job ({}) on image {}", job.name, job.id, job.image);

        let task_name = format!("Task-{}", job.id);
        let group_name = format!("Task-Group-{}", job.id);

        let request = self.build_job(job, &task_name, &group_name);
        let warnings = self.register(&request).await?;

        let outcome = self
            .run_registered(job, &task_name, &group_name, warnings)
            .await;

        // The batch job is one-shot; never leave it registered.
        self.deregister(&job.id).await;

        outcome
    }
}

// =============================================================================
// Nomad API payloads
// =============================================================================

#[derive(Debug, Serialize)]
struct RegisterRequest {
    #[serde(rename = "Job")]
    job: NomadJob,
}

#[derive(Debug, Serialize)]
struct NomadJob {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    job_type: &'static str,
    #[serde(rename = "Datacenters")]
    datacenters: Vec<String>,
    #[serde(rename = "TaskGroups")]
    task_groups: Vec<TaskGroup>,
    #[serde(rename = "Reschedule")]
    reschedule: ReschedulePolicy,
}

#[derive(Debug, Serialize)]
struct TaskGroup {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Tasks")]
    tasks: Vec<NomadTask>,
    #[serde(rename = "RestartPolicy")]
    restart_policy: RestartPolicy,
}

#[derive(Debug, Serialize)]
struct NomadTask {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Driver")]
    driver: &'static str,
    #[serde(rename = "Config")]
    config: TaskConfig,
    #[serde(rename = "Env", skip_serializing_if = "Option::is_none")]
    env: Option<HashMap<String, String>>,
    #[serde(rename = "Lifecycle", skip_serializing_if = "Option::is_none")]
    lifecycle: Option<Lifecycle>,
    #[serde(rename = "RestartPolicy")]
    restart_policy: RestartPolicy,
}

#[derive(Debug, Serialize)]
struct TaskConfig {
    image: String,
    args: Vec<String>,
    volumes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Lifecycle {
    #[serde(rename = "Hook")]
    hook: &'static str,
    #[serde(rename = "Sidecar")]
    sidecar: bool,
}

#[derive(Debug, Serialize)]
struct RestartPolicy {
    #[serde(rename = "Attempts")]
    attempts: u32,
}

#[derive(Debug, Serialize)]
struct ReschedulePolicy {
    #[serde(rename = "Attempts")]
    attempts: u32,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(rename = "Warnings", default)]
    warnings: String,
}

#[derive(Debug, Deserialize)]
struct JobSummaryResponse {
    #[serde(rename = "Summary", default)]
    summary: HashMap<String, TaskGroupSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TaskGroupSummary {
    #[serde(rename = "Complete", default)]
    complete: u64,
    #[serde(rename = "Failed", default)]
    failed: u64,
}

#[derive(Debug, Deserialize)]
struct AllocationStub {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct Allocation {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "TaskStates", default)]
    task_states: HashMap<String, TaskState>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskState {
    #[serde(rename = "Events", default)]
    events: Vec<TaskEvent>,
}

#[derive(Debug, Deserialize)]
struct TaskEvent {
    #[serde(rename = "Type", default)]
    event_type: String,
    #[serde(rename = "DisplayMessage", default)]
    display_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hector_core::domain::{ParamValue, Parameter};

    fn executor() -> NomadExecutor {
        NomadExecutor::new(
            "http://127.0.0.1:4646/",
            "hector/sidecar:latest",
            ObjectStoreConfig::default(),
        )
    }

    fn toy_job() -> Job {
        Job {
            id: "job-1".to_string(),
            name: "A".to_string(),
            image: "hector/toy:1.0.0".to_string(),
            arguments: vec![Parameter {
                name: "count".to_string(),
                value: ParamValue::Int(7),
            }],
            dependencies: vec![],
            required_files: vec![],
            output_files: vec![],
        }
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(executor().base_url, "http://127.0.0.1:4646");
    }

    #[test]
    fn test_payload_is_a_one_shot_batch_job() {
        let request = executor().build_job(&toy_job(), "Task-job-1", "Task-Group-job-1");
        let payload = serde_json::to_value(&request).unwrap();

        assert_eq!(payload["Job"]["Type"], "batch");
        assert_eq!(payload["Job"]["Reschedule"]["Attempts"], 0);

        let group = &payload["Job"]["TaskGroups"][0];
        assert_eq!(group["Name"], "Task-Group-job-1");
        assert_eq!(group["RestartPolicy"]["Attempts"], 0);

        let task = &group["Tasks"][0];
        assert_eq!(task["Name"], "Task-job-1");
        assert_eq!(task["Driver"], "docker");
        assert_eq!(task["Config"]["image"], "hector/toy:1.0.0");
        assert_eq!(
            task["Config"]["args"],
            serde_json::json!(["--count", "7"])
        );
    }

    #[test]
    fn test_sidecars_only_emitted_for_staged_files() {
        let mut job = toy_job();
        let bare = executor().build_job(&job, "t", "g");
        assert_eq!(bare.job.task_groups[0].tasks.len(), 1);

        job.required_files = vec!["bucket/input.csv".to_string()];
        job.output_files = vec!["bucket/out/result.csv".to_string()];
        let staged = executor().build_job(&job, "t", "g");
        let payload = serde_json::to_value(&staged).unwrap();
        let tasks = payload["Job"]["TaskGroups"][0]["Tasks"].as_array().unwrap();

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0]["Name"], DOWNLOAD_TASK);
        assert_eq!(tasks[0]["Lifecycle"]["Hook"], "prestart");
        assert_eq!(
            tasks[0]["Config"]["args"],
            serde_json::json!([
                "download",
                "--local-path",
                "data/input.csv",
                "--remote-path",
                "bucket/input.csv"
            ])
        );
        assert_eq!(tasks[2]["Name"], UPLOAD_TASK);
        assert_eq!(tasks[2]["Lifecycle"]["Hook"], "poststop");
    }
}
