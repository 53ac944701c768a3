//! Specification API Handlers
//!
//! Submitting a specification also computes and persists its planning, so
//! every later execution starts from a ready layered order.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use hector_core::domain::{Planning, Specification};

use crate::api::error::ApiResult;
use crate::api::{decode, AppState};
use crate::validate;

/// POST /specification/submit
/// Register a specification and persist its planning.
pub async fn submit_specification(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<StatusCode> {
    let specification: Specification = decode(body)?;
    tracing::info!("Submitting specification: {}", specification.id);

    validate::validate_specification(&specification)?;
    let planning = state.planner.plan(&specification)?;

    state
        .store
        .add_planning(&planning, &specification.id)
        .await?;
    state.store.add_specification(&specification).await?;

    Ok(StatusCode::OK)
}

/// GET /specification/get/{id}
pub async fn get_specification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Specification>> {
    tracing::debug!("Getting specification: {}", id);

    let specification = state.store.get_specification(&id).await?;
    Ok(Json(specification))
}

/// GET /topologicalSort/get/{id}
/// The layered planning computed for a specification.
pub async fn get_planning(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Planning>> {
    tracing::debug!("Getting planning for specification: {}", id);

    let planning = state.store.get_planning(&id).await?;
    Ok(Json(planning))
}
