//! Definition API Handlers
//!
//! Executing a definition is synchronous: the handler answers once the
//! invocation has reached a terminal state, with the service-minted id in
//! the body.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use hector_core::domain::Definition;
use hector_core::dto::ExecuteResponse;

use crate::api::error::ApiResult;
use crate::api::{decode, AppState};
use crate::validate;

/// POST /definition/execute
/// Persist the definition under a fresh id and run it to completion.
pub async fn execute_definition(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<ExecuteResponse>> {
    let mut definition: Definition = decode(body)?;
    validate::validate_definition(&definition)?;

    // A client-supplied id is ignored; the service mints its own.
    definition.id = Uuid::new_v4().to_string();
    state.store.add_definition(&definition).await?;

    tracing::info!("Executing definition {} ({})", definition.name, definition.id);
    state.controller.invoke(&definition).await?;

    Ok(Json(ExecuteResponse { id: definition.id }))
}

/// GET /definition/get/{id}
pub async fn get_definition(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Definition>> {
    tracing::debug!("Getting definition: {}", id);

    let definition = state.store.get_definition(&id).await?;
    Ok(Json(definition))
}
