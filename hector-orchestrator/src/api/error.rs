//! API Error Handling
//!
//! Unified error type and conversion for API responses. The status mapping
//! is deliberate: a failed lookup is a client error (the id does not name a
//! stored artifact), while duplicates, planning failures and store failures
//! surface as 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use hector_core::dto::ErrorBody;

use crate::controller::InvokeError;
use crate::planner::PlanError;
use crate::store::StoreError;
use crate::validate::ValidationError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            // Lookups by unknown id answer 400, matching the submit-side
            // contract that the id is part of the request.
            ApiError::NotFound(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            // Dangling dependencies rank with planner failures.
            ValidationError::DanglingDependency { .. } => ApiError::Internal(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<InvokeError> for ApiError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::MissingTask(_) | InvokeError::InvalidParameter { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            InvokeError::Store(store_err) => store_err.into(),
            InvokeError::Executor(_) | InvokeError::Join(_) => ApiError::Internal(err.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
