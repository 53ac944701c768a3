//! In-memory result store
//!
//! Hash maps behind async locks, used by the test suites and for local
//! development without a database file. Semantics mirror the SQLite store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use hector_core::domain::{
    Component, Definition, Planning, ResultDefinition, ResultJob, Specification,
};

use super::{ResultStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    components: RwLock<HashMap<String, Component>>,
    specifications: RwLock<HashMap<String, Specification>>,
    plannings: RwLock<HashMap<String, Planning>>,
    definitions: RwLock<HashMap<String, Definition>>,
    result_definitions: RwLock<HashMap<String, ResultDefinition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn add_component(&self, component: &Component) -> Result<(), StoreError> {
        let mut components = self.components.write().await;
        if components.contains_key(&component.id) {
            return Err(StoreError::duplicate("Component", &component.id));
        }
        components.insert(component.id.clone(), component.clone());
        Ok(())
    }

    async fn get_component(&self, id: &str) -> Result<Component, StoreError> {
        self.components
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Component", id))
    }

    async fn add_specification(&self, specification: &Specification) -> Result<(), StoreError> {
        let mut specifications = self.specifications.write().await;
        if specifications.contains_key(&specification.id) {
            return Err(StoreError::duplicate("Specification", &specification.id));
        }
        specifications.insert(specification.id.clone(), specification.clone());
        Ok(())
    }

    async fn get_specification(&self, id: &str) -> Result<Specification, StoreError> {
        self.specifications
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Specification", id))
    }

    async fn add_planning(
        &self,
        planning: &Planning,
        specification_id: &str,
    ) -> Result<(), StoreError> {
        let mut plannings = self.plannings.write().await;
        if plannings.contains_key(specification_id) {
            return Err(StoreError::duplicate("Planning", specification_id));
        }
        plannings.insert(specification_id.to_string(), planning.clone());
        Ok(())
    }

    async fn get_planning(&self, specification_id: &str) -> Result<Planning, StoreError> {
        self.plannings
            .read()
            .await
            .get(specification_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Planning", specification_id))
    }

    async fn add_definition(&self, definition: &Definition) -> Result<(), StoreError> {
        let mut definitions = self.definitions.write().await;
        if definitions.contains_key(&definition.id) {
            return Err(StoreError::duplicate("Definition", &definition.id));
        }
        definitions.insert(definition.id.clone(), definition.clone());
        Ok(())
    }

    async fn get_definition(&self, id: &str) -> Result<Definition, StoreError> {
        self.definitions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Definition", id))
    }

    async fn add_result_definition(
        &self,
        result_definition: &ResultDefinition,
    ) -> Result<(), StoreError> {
        let mut result_definitions = self.result_definitions.write().await;
        if result_definitions.contains_key(&result_definition.id) {
            return Err(StoreError::duplicate(
                "ResultDefinition",
                &result_definition.id,
            ));
        }
        result_definitions.insert(result_definition.id.clone(), result_definition.clone());
        Ok(())
    }

    async fn get_result_definition(&self, id: &str) -> Result<ResultDefinition, StoreError> {
        self.result_definitions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("ResultDefinition", id))
    }

    async fn update_result_job(
        &self,
        result_job: &ResultJob,
        result_definition_id: &str,
    ) -> Result<(), StoreError> {
        let mut result_definitions = self.result_definitions.write().await;
        let result_definition = result_definitions
            .get_mut(result_definition_id)
            .ok_or_else(|| StoreError::not_found("ResultDefinition", result_definition_id))?;

        match result_definition
            .result_jobs
            .iter_mut()
            .find(|existing| existing.id == result_job.id)
        {
            Some(existing) => *existing = result_job.clone(),
            None => result_definition.result_jobs.push(result_job.clone()),
        }
        Ok(())
    }

    async fn list_resumable_definitions(&self) -> Result<Vec<Definition>, StoreError> {
        let result_definitions = self.result_definitions.read().await;
        let definitions = self.definitions.read().await;

        let mut resumable = Vec::new();
        for result_definition in result_definitions.values() {
            if result_definition.has_waiting() {
                let definition = definitions
                    .get(&result_definition.id)
                    .cloned()
                    .ok_or_else(|| {
                        StoreError::not_found("Definition", &result_definition.id)
                    })?;
                resumable.push(definition);
            }
        }
        Ok(resumable)
    }
}
