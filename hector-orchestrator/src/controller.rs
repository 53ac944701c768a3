//! Controller
//!
//! End-to-end orchestration of one execution: join the Definition with its
//! Specification and Components, emit the layered job list, then drive the
//! layers through the executor with per-layer barriers, writing every status
//! transition through to the result store as it happens. Jobs whose
//! dependencies failed are cancelled without dispatch; executor
//! infrastructure failures abort the invocation and leave the persisted
//! partial state for a later resume.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info};
use uuid::Uuid;

use hector_core::domain::{
    Definition, Job, Parameter, Planning, Put, ResultDefinition, ResultJob, Specification, Status,
};

use crate::executor::{Executor, ExecutorError};
use crate::store::{ResultStore, StoreError};

/// Logs attached to a job cancelled because of a failed dependency.
pub const CANCELLED_LOGS: &str = "Cancelled due to errors in its dependencies";

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("task {0} is required in the specification but is not present in the definition")]
    MissingTask(String),

    #[error("parameter {name} is invalid: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("executor failure: {0}")]
    Executor(#[from] ExecutorError),

    #[error("job task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

type StatusMap = Arc<RwLock<HashMap<String, ResultJob>>>;

pub struct Controller {
    store: Arc<dyn ResultStore>,
    executor: Arc<dyn Executor>,
}

impl Controller {
    pub fn new(store: Arc<dyn ResultStore>, executor: Arc<dyn Executor>) -> Self {
        Self { store, executor }
    }

    /// Runs a definition to completion and returns its execution record.
    pub async fn invoke(&self, definition: &Definition) -> Result<ResultDefinition, InvokeError> {
        let specification = self
            .store
            .get_specification(&definition.specification_id)
            .await?;
        let planning = self.store.get_planning(&definition.specification_id).await?;

        check_task_names(definition, &specification)?;
        let nested_jobs = self
            .collect_jobs(definition, &specification, &planning)
            .await?;

        let result_definition = self.load_or_init_result(definition, &nested_jobs).await?;
        let result_jobs = self
            .execute_layers(&nested_jobs, &result_definition)
            .await?;

        Ok(ResultDefinition {
            result_jobs,
            ..result_definition
        })
    }

    /// Joins the definition with the specification and components, layer by
    /// layer, validating parameters on the way.
    async fn collect_jobs(
        &self,
        definition: &Definition,
        specification: &Specification,
        planning: &Planning,
    ) -> Result<Vec<Vec<Job>>, InvokeError> {
        let mut nested_jobs = Vec::with_capacity(planning.layers.len());
        for layer in &planning.layers {
            let mut jobs = Vec::with_capacity(layer.len());
            for task_name in layer {
                jobs.push(self.build_job(definition, specification, task_name).await?);
            }
            nested_jobs.push(jobs);
        }
        Ok(nested_jobs)
    }

    async fn build_job(
        &self,
        definition: &Definition,
        specification: &Specification,
        task_name: &str,
    ) -> Result<Job, InvokeError> {
        let definition_task = definition
            .data
            .tasks
            .iter()
            .find(|task| task.name == task_name)
            .ok_or_else(|| InvokeError::MissingTask(task_name.to_string()))?;
        let specification_task = specification
            .task(task_name)
            .ok_or_else(|| InvokeError::MissingTask(task_name.to_string()))?;

        let component = self
            .store
            .get_component(&specification_task.component_id)
            .await?;
        check_parameters(&definition_task.inputs, &component.inputs)?;
        check_parameters(&definition_task.outputs, &component.outputs)?;

        let mut arguments = definition_task.inputs.clone();
        arguments.extend(definition_task.outputs.iter().cloned());

        Ok(Job {
            id: Uuid::new_v4().to_string(),
            name: task_name.to_string(),
            image: component.container.image.clone(),
            arguments,
            dependencies: specification_task.dependencies.clone(),
            required_files: vec![],
            output_files: vec![],
        })
    }

    /// Loads the prior execution record, or creates one with every job
    /// waiting. The load path is what makes resumes work.
    async fn load_or_init_result(
        &self,
        definition: &Definition,
        nested_jobs: &[Vec<Job>],
    ) -> Result<ResultDefinition, InvokeError> {
        match self.store.get_result_definition(&definition.id).await {
            Ok(existing) => {
                debug!("Found prior execution record for {}", definition.id);
                Ok(existing)
            }
            Err(err) if err.is_not_found() => {
                info!("{} A new record is created.", err);
                let result_definition = ResultDefinition {
                    id: definition.id.clone(),
                    name: definition.name.clone(),
                    specification_id: definition.specification_id.clone(),
                    result_jobs: nested_jobs
                        .iter()
                        .flatten()
                        .map(|job| ResultJob::waiting(&job.id, &job.name))
                        .collect(),
                };
                self.store.add_result_definition(&result_definition).await?;
                Ok(result_definition)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Runs the layered schedule. Within a layer every eligible job is
    /// dispatched concurrently; the layer barrier holds until all of them
    /// are terminal, so a dependency's status is always settled before its
    /// dependants are considered.
    async fn execute_layers(
        &self,
        nested_jobs: &[Vec<Job>],
        result_definition: &ResultDefinition,
    ) -> Result<Vec<ResultJob>, InvokeError> {
        let results: StatusMap = Arc::new(RwLock::new(
            result_definition
                .result_jobs
                .iter()
                .map(|result_job| (result_job.name.clone(), result_job.clone()))
                .collect(),
        ));

        for layer in nested_jobs {
            let mut dispatched: JoinSet<Result<(), InvokeError>> = JoinSet::new();

            for job in layer {
                if !self
                    .eligible_for_dispatch(job, &results, &result_definition.id)
                    .await?
                {
                    continue;
                }

                let job = job.clone();
                let executor = Arc::clone(&self.executor);
                let store = Arc::clone(&self.store);
                let results = Arc::clone(&results);
                let result_definition_id = result_definition.id.clone();
                dispatched.spawn(async move {
                    let result_job = executor.execute_job(&job).await?;
                    {
                        let mut map = results.write().unwrap();
                        map.insert(job.name.clone(), result_job.clone());
                    }
                    store
                        .update_result_job(&result_job, &result_definition_id)
                        .await?;
                    Ok(())
                });
            }

            // Layer barrier. The first infrastructure error surfaces here
            // and dropping the JoinSet aborts the rest of the layer.
            while let Some(joined) = dispatched.join_next().await {
                joined??;
            }
        }

        let map = results.read().unwrap();
        Ok(nested_jobs
            .iter()
            .flatten()
            .map(|job| {
                map.get(&job.name)
                    .cloned()
                    .unwrap_or_else(|| ResultJob::waiting(&job.id, &job.name))
            })
            .collect())
    }

    /// Skips jobs that already reached a terminal status in a prior run and
    /// cancels jobs whose dependency chain failed, persisting the synthesized
    /// record. Returns whether the job should be dispatched.
    async fn eligible_for_dispatch(
        &self,
        job: &Job,
        results: &StatusMap,
        result_definition_id: &str,
    ) -> Result<bool, InvokeError> {
        let failed_dependency = {
            let map = results.read().unwrap();
            let status = map
                .get(&job.name)
                .map(|result_job| result_job.status)
                .unwrap_or_default();
            if status.is_terminal() {
                return Ok(false);
            }

            job.dependencies.iter().any(|dependency| {
                matches!(
                    map.get(dependency).map(|result_job| result_job.status),
                    Some(Status::Error | Status::Cancelled)
                )
            })
        };

        if failed_dependency {
            let result_job = ResultJob {
                id: job.id.clone(),
                name: job.name.clone(),
                logs: CANCELLED_LOGS.to_string(),
                status: Status::Cancelled,
            };
            results
                .write()
                .unwrap()
                .insert(job.name.clone(), result_job.clone());
            self.store
                .update_result_job(&result_job, result_definition_id)
                .await?;
            return Ok(false);
        }

        Ok(true)
    }
}

/// Every task of the specification must be bound in the definition.
fn check_task_names(
    definition: &Definition,
    specification: &Specification,
) -> Result<(), InvokeError> {
    for specification_task in specification.tasks() {
        let bound = definition
            .data
            .tasks
            .iter()
            .any(|task| task.name == specification_task.name);
        if !bound {
            return Err(InvokeError::MissingTask(specification_task.name.clone()));
        }
    }
    Ok(())
}

/// Every declared input/output must be present with a matching runtime type.
fn check_parameters(parameters: &[Parameter], declared: &[Put]) -> Result<(), InvokeError> {
    for put in declared {
        let parameter = parameters
            .iter()
            .find(|parameter| parameter.name == put.name)
            .ok_or_else(|| InvokeError::InvalidParameter {
                name: put.name.clone(),
                reason: "required but not provided".to_string(),
            })?;

        let actual = parameter.value.value_type();
        if actual != put.value_type {
            return Err(InvokeError::InvalidParameter {
                name: put.name.clone(),
                reason: format!("expected {} but got {}", put.value_type, actual),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;

    use hector_core::domain::{
        Component, Container, Dag, Data, DefinitionTask, ParamValue, Spec, SpecificationTask,
        ValueType,
    };

    use crate::planner::{Planner, TopologicalGrouped};
    use crate::store::MemoryStore;

    /// Executor with pre-decided outcomes, recording calls and timing.
    #[derive(Default)]
    struct ScriptedExecutor {
        failing: HashSet<String>,
        infrastructure_failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
        spans: Mutex<HashMap<String, (Instant, Instant)>>,
    }

    impl ScriptedExecutor {
        fn with_failing(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|name| name.to_string()).collect(),
                ..Self::default()
            }
        }

        fn with_infrastructure_failing(names: &[&str]) -> Self {
            Self {
                infrastructure_failing: names.iter().map(|name| name.to_string()).collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Executor for ScriptedExecutor {
        async fn execute_job(&self, job: &Job) -> Result<ResultJob, ExecutorError> {
            let started = Instant::now();
            self.calls.lock().unwrap().push(job.name.clone());
            tokio::time::sleep(Duration::from_millis(10)).await;

            if self.infrastructure_failing.contains(&job.name) {
                return Err(ExecutorError::Runtime("driver connection lost".to_string()));
            }

            let (status, logs) = if self.failing.contains(&job.name) {
                (Status::Error, "File not found exception")
            } else {
                (Status::Done, "All right")
            };
            self.spans
                .lock()
                .unwrap()
                .insert(job.name.clone(), (started, Instant::now()));

            Ok(ResultJob {
                id: job.id.clone(),
                name: job.name.clone(),
                logs: logs.to_string(),
                status,
            })
        }
    }

    fn echo_component() -> Component {
        Component {
            id: "comp-echo".to_string(),
            name: "echo".to_string(),
            api_version: "hector/v1".to_string(),
            inputs: vec![Put {
                name: "message".to_string(),
                value_type: ValueType::String,
            }],
            outputs: vec![],
            container: Container {
                dockerfile: "./components/echo/Dockerfile".to_string(),
                image: "hector/echo:1.0.0".to_string(),
                command: vec![],
            },
        }
    }

    fn specification_from(edges: &[(&str, &[&str])]) -> Specification {
        Specification {
            id: "spec-test".to_string(),
            name: "test".to_string(),
            api_version: "hector/v1".to_string(),
            spec: Spec {
                dag: Dag {
                    tasks: edges
                        .iter()
                        .map(|(name, deps)| SpecificationTask {
                            name: name.to_string(),
                            dependencies: deps.iter().map(|dep| dep.to_string()).collect(),
                            component_id: "comp-echo".to_string(),
                        })
                        .collect(),
                },
            },
        }
    }

    fn definition_for(specification: &Specification) -> Definition {
        Definition {
            id: "def-test".to_string(),
            name: "test run".to_string(),
            specification_id: specification.id.clone(),
            api_version: "hector/v1".to_string(),
            data: Data {
                tasks: specification
                    .tasks()
                    .iter()
                    .map(|task| DefinitionTask {
                        name: task.name.clone(),
                        inputs: vec![Parameter {
                            name: "message".to_string(),
                            value: ParamValue::String(format!("hello from {}", task.name)),
                        }],
                        outputs: vec![],
                    })
                    .collect(),
            },
        }
    }

    async fn seed(store: &MemoryStore, specification: &Specification) {
        store.add_component(&echo_component()).await.unwrap();
        store.add_specification(specification).await.unwrap();
        let planning = TopologicalGrouped.plan(specification).unwrap();
        store
            .add_planning(&planning, &specification.id)
            .await
            .unwrap();
    }

    fn statuses(result_definition: &ResultDefinition) -> HashMap<String, Status> {
        result_definition
            .result_jobs
            .iter()
            .map(|job| (job.name.clone(), job.status))
            .collect()
    }

    const DIAMOND: &[(&str, &[&str])] = &[
        ("A", &[]),
        ("B", &["A"]),
        ("C", &["A"]),
        ("D", &["B", "C"]),
    ];

    #[tokio::test]
    async fn test_linear_chain_runs_to_done() {
        let specification =
            specification_from(&[("A", &[]), ("B", &["A"]), ("C", &["B"]), ("D", &["C"])]);
        let store = Arc::new(MemoryStore::new());
        seed(&store, &specification).await;
        let definition = definition_for(&specification);
        store.add_definition(&definition).await.unwrap();

        let executor = Arc::new(ScriptedExecutor::default());
        let controller = Controller::new(store.clone(), executor.clone());

        let result = controller.invoke(&definition).await.unwrap();
        let names: Vec<&str> = result.result_jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        assert!(result.result_jobs.iter().all(|j| j.status == Status::Done));
        assert_eq!(executor.calls(), vec!["A", "B", "C", "D"]);

        // Every transition landed in the store.
        let stored = store.get_result_definition(&definition.id).await.unwrap();
        assert!(stored.result_jobs.iter().all(|j| j.status == Status::Done));
    }

    #[tokio::test]
    async fn test_diamond_failure_cancels_dependants() {
        let specification = specification_from(DIAMOND);
        let store = Arc::new(MemoryStore::new());
        seed(&store, &specification).await;
        let definition = definition_for(&specification);
        store.add_definition(&definition).await.unwrap();

        let executor = Arc::new(ScriptedExecutor::with_failing(&["B"]));
        let controller = Controller::new(store.clone(), executor.clone());

        let result = controller.invoke(&definition).await.unwrap();
        let by_status = statuses(&result);
        assert_eq!(by_status["A"], Status::Done);
        assert_eq!(by_status["B"], Status::Error);
        assert_eq!(by_status["C"], Status::Done);
        assert_eq!(by_status["D"], Status::Cancelled);

        let cancelled = result
            .result_jobs
            .iter()
            .find(|job| job.name == "D")
            .unwrap();
        assert_eq!(cancelled.logs, CANCELLED_LOGS);

        // D was never handed to the executor.
        assert!(!executor.calls().contains(&"D".to_string()));
    }

    #[tokio::test]
    async fn test_failure_cancels_the_whole_dependency_closure() {
        let specification =
            specification_from(&[("A", &[]), ("B", &["A"]), ("C", &["B"])]);
        let store = Arc::new(MemoryStore::new());
        seed(&store, &specification).await;
        let definition = definition_for(&specification);
        store.add_definition(&definition).await.unwrap();

        let executor = Arc::new(ScriptedExecutor::with_failing(&["A"]));
        let controller = Controller::new(store.clone(), executor.clone());

        let result = controller.invoke(&definition).await.unwrap();
        let by_status = statuses(&result);
        assert_eq!(by_status["A"], Status::Error);
        assert_eq!(by_status["B"], Status::Cancelled);
        assert_eq!(by_status["C"], Status::Cancelled);
        assert_eq!(executor.calls(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_layer_barrier_orders_dependencies() {
        let specification = specification_from(DIAMOND);
        let store = Arc::new(MemoryStore::new());
        seed(&store, &specification).await;
        let definition = definition_for(&specification);
        store.add_definition(&definition).await.unwrap();

        let executor = Arc::new(ScriptedExecutor::default());
        let controller = Controller::new(store.clone(), executor.clone());
        controller.invoke(&definition).await.unwrap();

        let spans = executor.spans.lock().unwrap().clone();
        for (parent, child) in [("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")] {
            let (_, parent_end) = spans[parent];
            let (child_start, _) = spans[child];
            assert!(parent_end <= child_start, "{parent} must finish before {child} starts");
        }
    }

    #[tokio::test]
    async fn test_parameter_type_mismatch_aborts_before_dispatch() {
        let specification = specification_from(&[("A", &[])]);
        let store = Arc::new(MemoryStore::new());
        seed(&store, &specification).await;

        let mut definition = definition_for(&specification);
        definition.data.tasks[0].inputs[0].value = ParamValue::Int(42);
        store.add_definition(&definition).await.unwrap();

        let executor = Arc::new(ScriptedExecutor::default());
        let controller = Controller::new(store.clone(), executor.clone());

        let err = controller.invoke(&definition).await.unwrap_err();
        match err {
            InvokeError::InvalidParameter { name, .. } => assert_eq!(name, "message"),
            other => panic!("unexpected error: {other}"),
        }

        // Nothing ran and no execution record was created.
        assert!(executor.calls().is_empty());
        let missing = store.get_result_definition(&definition.id).await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_definition_task_aborts() {
        let specification = specification_from(&[("A", &[]), ("B", &["A"])]);
        let store = Arc::new(MemoryStore::new());
        seed(&store, &specification).await;

        let mut definition = definition_for(&specification);
        definition.data.tasks.retain(|task| task.name != "A");
        store.add_definition(&definition).await.unwrap();

        let controller = Controller::new(store.clone(), Arc::new(ScriptedExecutor::default()));
        let err = controller.invoke(&definition).await.unwrap_err();
        assert!(matches!(err, InvokeError::MissingTask(name) if name == "A"));
    }

    #[tokio::test]
    async fn test_unknown_specification_propagates_not_found() {
        let store = Arc::new(MemoryStore::new());
        let controller = Controller::new(store.clone(), Arc::new(ScriptedExecutor::default()));

        let definition = Definition {
            id: "def-test".to_string(),
            name: "test".to_string(),
            specification_id: "spec-missing".to_string(),
            api_version: "hector/v1".to_string(),
            data: Data { tasks: vec![] },
        };
        let err = controller.invoke(&definition).await.unwrap_err();
        assert!(matches!(err, InvokeError::Store(ref store_err) if store_err.is_not_found()));
    }

    #[tokio::test]
    async fn test_resume_skips_terminal_jobs() {
        let specification = specification_from(DIAMOND);
        let store = Arc::new(MemoryStore::new());
        seed(&store, &specification).await;
        let definition = definition_for(&specification);
        store.add_definition(&definition).await.unwrap();

        // Simulate a crash after A completed: A is terminal, the rest still
        // waits.
        store
            .add_result_definition(&ResultDefinition {
                id: definition.id.clone(),
                name: definition.name.clone(),
                specification_id: definition.specification_id.clone(),
                result_jobs: vec![
                    ResultJob {
                        id: "job-a".to_string(),
                        name: "A".to_string(),
                        logs: "All right".to_string(),
                        status: Status::Done,
                    },
                    ResultJob::waiting("job-b", "B"),
                    ResultJob::waiting("job-c", "C"),
                    ResultJob::waiting("job-d", "D"),
                ],
            })
            .await
            .unwrap();

        let executor = Arc::new(ScriptedExecutor::default());
        let controller = Controller::new(store.clone(), executor.clone());
        let result = controller.invoke(&definition).await.unwrap();

        // A was not re-run; the rest completed as in an uninterrupted run.
        assert!(!executor.calls().contains(&"A".to_string()));
        assert!(result.result_jobs.iter().all(|j| j.status == Status::Done));
    }

    #[tokio::test]
    async fn test_infrastructure_error_aborts_and_keeps_partial_state() {
        let specification = specification_from(DIAMOND);
        let store = Arc::new(MemoryStore::new());
        seed(&store, &specification).await;
        let definition = definition_for(&specification);
        store.add_definition(&definition).await.unwrap();

        let executor = Arc::new(ScriptedExecutor::with_infrastructure_failing(&["B"]));
        let controller = Controller::new(store.clone(), executor.clone());

        let err = controller.invoke(&definition).await.unwrap_err();
        assert!(matches!(err, InvokeError::Executor(_)));

        // A's completion was persisted before the abort; B never got a
        // terminal status, so the record stays resumable.
        let stored = store.get_result_definition(&definition.id).await.unwrap();
        let by_status = statuses(&stored);
        assert_eq!(by_status["A"], Status::Done);
        assert_eq!(by_status["B"], Status::Waiting);
        assert_eq!(by_status["D"], Status::Waiting);
        assert!(stored.has_waiting());
    }
}
