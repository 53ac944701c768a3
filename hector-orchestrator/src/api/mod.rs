//! API Module
//!
//! HTTP API layer of the orchestrator. Each submodule handles the endpoints
//! for one artifact kind; the shared state carries the store, the planner
//! and the controller, all behind their capability traits.

pub mod component;
pub mod definition;
pub mod error;
pub mod health;
pub mod result;
pub mod specification;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;

use crate::controller::Controller;
use crate::planner::Planner;
use crate::store::ResultStore;

use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResultStore>,
    pub planner: Arc<dyn Planner>,
    pub controller: Arc<Controller>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Component endpoints
        .route("/component/submit", post(component::submit_component))
        .route("/component/get/{id}", get(component::get_component))
        // Specification endpoints
        .route(
            "/specification/submit",
            post(specification::submit_specification),
        )
        .route(
            "/specification/get/{id}",
            get(specification::get_specification),
        )
        .route("/topologicalSort/get/{id}", get(specification::get_planning))
        // Definition and result endpoints
        .route("/definition/execute", post(definition::execute_definition))
        .route("/definition/get/{id}", get(definition::get_definition))
        .route("/result/get/{id}", get(result::get_result_definition))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Decodes a request body, answering 400 on any schema mismatch.
pub(crate) fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))
}
