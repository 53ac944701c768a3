//! Result store
//!
//! Durable persistence for every artifact kind plus the scoped per-job
//! update used during execution. Two implementations sit behind the same
//! trait: an in-memory store for tests and development and the SQLite store
//! used in production.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

use hector_core::domain::{
    Component, Definition, Planning, ResultDefinition, ResultJob, Specification,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} with id {id} not found in the store")]
    NotFound { kind: &'static str, id: String },

    #[error("a {kind} with id {id} is already stored")]
    Duplicate { kind: &'static str, id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn duplicate(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::Duplicate {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Capability set of the result store.
///
/// Artifacts are immutable: every `add_*` either succeeds and makes the
/// entity visible to subsequent gets, or fails leaving the store unchanged.
/// `update_result_job` is the only mutation and must be atomic against
/// concurrent updates to the same ResultDefinition.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn add_component(&self, component: &Component) -> Result<(), StoreError>;
    async fn get_component(&self, id: &str) -> Result<Component, StoreError>;

    async fn add_specification(&self, specification: &Specification) -> Result<(), StoreError>;
    async fn get_specification(&self, id: &str) -> Result<Specification, StoreError>;

    /// Stores the planning computed for a Specification, keyed by the
    /// specification id.
    async fn add_planning(
        &self,
        planning: &Planning,
        specification_id: &str,
    ) -> Result<(), StoreError>;
    async fn get_planning(&self, specification_id: &str) -> Result<Planning, StoreError>;

    async fn add_definition(&self, definition: &Definition) -> Result<(), StoreError>;
    async fn get_definition(&self, id: &str) -> Result<Definition, StoreError>;

    async fn add_result_definition(
        &self,
        result_definition: &ResultDefinition,
    ) -> Result<(), StoreError>;
    async fn get_result_definition(&self, id: &str) -> Result<ResultDefinition, StoreError>;

    /// Inserts the ResultJob into the containing ResultDefinition if no
    /// entry with the same id exists, otherwise replaces it.
    async fn update_result_job(
        &self,
        result_job: &ResultJob,
        result_definition_id: &str,
    ) -> Result<(), StoreError>;

    /// Every Definition whose ResultDefinition still contains a WAITING job.
    async fn list_resumable_definitions(&self) -> Result<Vec<Definition>, StoreError>;
}
