//! Definition and result endpoints

use crate::error::Result;
use crate::HectorClient;
use hector_core::domain::{Definition, ResultDefinition};
use hector_core::dto::ExecuteResponse;

impl HectorClient {
    /// Submit a definition for execution. The call returns once the
    /// execution has reached a terminal state; the response carries the
    /// service-minted definition id.
    pub async fn execute_definition(&self, definition: &Definition) -> Result<ExecuteResponse> {
        let url = format!("{}/definition/execute", self.base_url);
        let response = self.client.post(&url).json(definition).send().await?;

        self.handle_response(response).await
    }

    /// Fetch a definition by id.
    pub async fn get_definition(&self, id: &str) -> Result<Definition> {
        let url = format!("{}/definition/get/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Fetch the execution record of a definition.
    pub async fn get_result_definition(&self, id: &str) -> Result<ResultDefinition> {
        let url = format!("{}/result/get/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
