//! Specification endpoints

use crate::error::Result;
use crate::HectorClient;
use hector_core::domain::{Planning, Specification};

impl HectorClient {
    /// Register a new specification; the orchestrator computes and persists
    /// its planning as a side effect.
    pub async fn submit_specification(&self, specification: &Specification) -> Result<()> {
        let url = format!("{}/specification/submit", self.base_url);
        let response = self.client.post(&url).json(specification).send().await?;

        self.handle_empty_response(response).await
    }

    /// Fetch a specification by id.
    pub async fn get_specification(&self, id: &str) -> Result<Specification> {
        let url = format!("{}/specification/get/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Fetch the layered planning computed for a specification.
    pub async fn get_planning(&self, specification_id: &str) -> Result<Planning> {
        let url = format!("{}/topologicalSort/get/{}", self.base_url, specification_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
