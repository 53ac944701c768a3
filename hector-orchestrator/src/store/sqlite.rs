//! SQLite result store
//!
//! Everything lives in the single `hector(id, content)` table: the entity
//! kind is a fixed prefix on the id and `content` is the JSON serialization
//! of the entity. The pool holds one connection (see `db.rs`), so the
//! read-modify-write in `update_result_job` serializes against concurrent
//! updates to the same row.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use hector_core::domain::{
    Component, Definition, Planning, ResultDefinition, ResultJob, Specification,
};

use super::{ResultStore, StoreError};

pub const COMPONENT_PREFIX: &str = "comp-";
pub const SPECIFICATION_PREFIX: &str = "spec-";
pub const PLANNING_PREFIX: &str = "plan-";
pub const DEFINITION_PREFIX: &str = "def-";
pub const RESULT_DEFINITION_PREFIX: &str = "resdef-";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_entity<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        prefix: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        let row: Option<String> =
            sqlx::query_scalar("SELECT content FROM hector WHERE id = ?")
                .bind(format!("{prefix}{id}"))
                .fetch_optional(&self.pool)
                .await?;

        let content = row.ok_or_else(|| StoreError::not_found(kind, id))?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn add_entity<T: Serialize>(
        &self,
        kind: &'static str,
        prefix: &str,
        id: &str,
        entity: &T,
    ) -> Result<(), StoreError> {
        let content = serde_json::to_string(entity)?;
        let result = sqlx::query("INSERT INTO hector(id, content) VALUES(?, ?)")
            .bind(format!("{prefix}{id}"))
            .bind(content)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::duplicate(kind, id))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl ResultStore for SqliteStore {
    async fn add_component(&self, component: &Component) -> Result<(), StoreError> {
        self.add_entity("Component", COMPONENT_PREFIX, &component.id, component)
            .await
    }

    async fn get_component(&self, id: &str) -> Result<Component, StoreError> {
        self.get_entity("Component", COMPONENT_PREFIX, id).await
    }

    async fn add_specification(&self, specification: &Specification) -> Result<(), StoreError> {
        self.add_entity(
            "Specification",
            SPECIFICATION_PREFIX,
            &specification.id,
            specification,
        )
        .await
    }

    async fn get_specification(&self, id: &str) -> Result<Specification, StoreError> {
        self.get_entity("Specification", SPECIFICATION_PREFIX, id)
            .await
    }

    async fn add_planning(
        &self,
        planning: &Planning,
        specification_id: &str,
    ) -> Result<(), StoreError> {
        self.add_entity("Planning", PLANNING_PREFIX, specification_id, planning)
            .await
    }

    async fn get_planning(&self, specification_id: &str) -> Result<Planning, StoreError> {
        self.get_entity("Planning", PLANNING_PREFIX, specification_id)
            .await
    }

    async fn add_definition(&self, definition: &Definition) -> Result<(), StoreError> {
        self.add_entity("Definition", DEFINITION_PREFIX, &definition.id, definition)
            .await
    }

    async fn get_definition(&self, id: &str) -> Result<Definition, StoreError> {
        self.get_entity("Definition", DEFINITION_PREFIX, id).await
    }

    async fn add_result_definition(
        &self,
        result_definition: &ResultDefinition,
    ) -> Result<(), StoreError> {
        self.add_entity(
            "ResultDefinition",
            RESULT_DEFINITION_PREFIX,
            &result_definition.id,
            result_definition,
        )
        .await
    }

    async fn get_result_definition(&self, id: &str) -> Result<ResultDefinition, StoreError> {
        self.get_entity("ResultDefinition", RESULT_DEFINITION_PREFIX, id)
            .await
    }

    async fn update_result_job(
        &self,
        result_job: &ResultJob,
        result_definition_id: &str,
    ) -> Result<(), StoreError> {
        let row_id = format!("{RESULT_DEFINITION_PREFIX}{result_definition_id}");
        let mut tx = self.pool.begin().await?;

        let row: Option<String> =
            sqlx::query_scalar("SELECT content FROM hector WHERE id = ?")
                .bind(&row_id)
                .fetch_optional(&mut *tx)
                .await?;
        let content = row
            .ok_or_else(|| StoreError::not_found("ResultDefinition", result_definition_id))?;
        let mut result_definition: ResultDefinition = serde_json::from_str(&content)?;

        match result_definition
            .result_jobs
            .iter_mut()
            .find(|existing| existing.id == result_job.id)
        {
            Some(existing) => *existing = result_job.clone(),
            None => result_definition.result_jobs.push(result_job.clone()),
        }

        sqlx::query("UPDATE hector SET content = ? WHERE id = ?")
            .bind(serde_json::to_string(&result_definition)?)
            .bind(&row_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_resumable_definitions(&self) -> Result<Vec<Definition>, StoreError> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT content FROM hector WHERE id LIKE ?")
                .bind(format!("{RESULT_DEFINITION_PREFIX}%"))
                .fetch_all(&self.pool)
                .await?;

        let mut resumable = Vec::new();
        for content in rows {
            let result_definition: ResultDefinition = serde_json::from_str(&content)?;
            if result_definition.has_waiting() {
                resumable.push(self.get_definition(&result_definition.id).await?);
            }
        }
        Ok(resumable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use hector_core::domain::{Container, Data, Status};

    async fn temp_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hector.sqlite");
        let pool = db::create_pool(path.to_str().unwrap()).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        (SqliteStore::new(pool), dir)
    }

    fn toy_component(id: &str) -> Component {
        Component {
            id: id.to_string(),
            name: "toy".to_string(),
            api_version: "hector/v1".to_string(),
            inputs: vec![],
            outputs: vec![],
            container: Container {
                dockerfile: "./Dockerfile".to_string(),
                image: "hector/toy:1.0.0".to_string(),
                command: vec![],
            },
        }
    }

    #[tokio::test]
    async fn test_add_get_round_trip() {
        let (store, _dir) = temp_store().await;
        let component = toy_component("comp-1");

        store.add_component(&component).await.unwrap();
        assert_eq!(store.get_component("comp-1").await.unwrap(), component);

        let err = store.get_component("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let (store, _dir) = temp_store().await;
        let component = toy_component("comp-1");

        store.add_component(&component).await.unwrap();
        let err = store.add_component(&component).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_prefixes_keep_entity_kinds_apart() {
        let (store, _dir) = temp_store().await;
        // Same bare id under two prefixes must not collide.
        store.add_component(&toy_component("shared")).await.unwrap();
        store
            .add_planning(&Planning::new(vec![vec!["A".to_string()]]), "shared")
            .await
            .unwrap();

        assert!(store.get_planning("shared").await.is_ok());
        assert!(store.get_component("shared").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_result_job_read_modify_write() {
        let (store, _dir) = temp_store().await;
        let result_definition = ResultDefinition {
            id: "def-1".to_string(),
            name: "toy".to_string(),
            specification_id: "spec-1".to_string(),
            result_jobs: vec![ResultJob::waiting("job-a", "A")],
        };
        store
            .add_result_definition(&result_definition)
            .await
            .unwrap();

        // Replace the existing entry.
        let done = ResultJob {
            id: "job-a".to_string(),
            name: "A".to_string(),
            logs: "All right".to_string(),
            status: Status::Done,
        };
        store.update_result_job(&done, "def-1").await.unwrap();

        // Insert a fresh entry for an id not present yet.
        let extra = ResultJob {
            id: "job-b".to_string(),
            name: "B".to_string(),
            logs: String::new(),
            status: Status::Error,
        };
        store.update_result_job(&extra, "def-1").await.unwrap();

        let stored = store.get_result_definition("def-1").await.unwrap();
        assert_eq!(stored.result_jobs, vec![done, extra]);
    }

    #[tokio::test]
    async fn test_list_resumable_definitions_scans_result_rows() {
        let (store, _dir) = temp_store().await;
        let definition = Definition {
            id: "def-1".to_string(),
            name: "toy".to_string(),
            specification_id: "spec-1".to_string(),
            api_version: "hector/v1".to_string(),
            data: Data { tasks: vec![] },
        };
        store.add_definition(&definition).await.unwrap();
        store
            .add_result_definition(&ResultDefinition {
                id: "def-1".to_string(),
                name: "toy".to_string(),
                specification_id: "spec-1".to_string(),
                result_jobs: vec![ResultJob::waiting("job-a", "A")],
            })
            .await
            .unwrap();

        assert_eq!(
            store.list_resumable_definitions().await.unwrap(),
            vec![definition]
        );

        let done = ResultJob {
            id: "job-a".to_string(),
            name: "A".to_string(),
            logs: String::new(),
            status: Status::Done,
        };
        store.update_result_job(&done, "def-1").await.unwrap();
        assert!(store.list_resumable_definitions().await.unwrap().is_empty());
    }
}
