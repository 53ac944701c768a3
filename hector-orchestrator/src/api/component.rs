//! Component API Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use hector_core::domain::Component;

use crate::api::error::ApiResult;
use crate::api::{decode, AppState};
use crate::validate;

/// POST /component/submit
/// Register a new component.
pub async fn submit_component(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<StatusCode> {
    let component: Component = decode(body)?;
    tracing::info!("Submitting component: {}", component.id);

    validate::validate_component(&component)?;
    state.store.add_component(&component).await?;

    Ok(StatusCode::OK)
}

/// GET /component/get/{id}
pub async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Component>> {
    tracing::debug!("Getting component: {}", id);

    let component = state.store.get_component(&id).await?;
    Ok(Json(component))
}
