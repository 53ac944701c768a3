//! Component endpoints

use crate::error::Result;
use crate::HectorClient;
use hector_core::domain::Component;

impl HectorClient {
    /// Register a new component.
    pub async fn submit_component(&self, component: &Component) -> Result<()> {
        let url = format!("{}/component/submit", self.base_url);
        let response = self.client.post(&url).json(component).send().await?;

        self.handle_empty_response(response).await
    }

    /// Fetch a component by id.
    pub async fn get_component(&self, id: &str) -> Result<Component> {
        let url = format!("{}/component/get/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
