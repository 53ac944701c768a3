//! Result API Handlers

use axum::{
    extract::{Path, State},
    Json,
};

use hector_core::domain::ResultDefinition;

use crate::api::error::ApiResult;
use crate::api::AppState;

/// GET /result/get/{id}
/// Current execution record of a definition, live while it runs.
pub async fn get_result_definition(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultDefinition>> {
    tracing::debug!("Getting result definition: {}", id);

    let result_definition = state.store.get_result_definition(&id).await?;
    Ok(Json(result_definition))
}
