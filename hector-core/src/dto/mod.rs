//! Data Transfer Objects for the HTTP API
//!
//! The artifacts themselves travel as their domain serializations; only the
//! few responses that are not artifacts live here.

use serde::{Deserialize, Serialize};

/// Response of `POST /definition/execute`: the service-minted definition id,
/// returned once the invocation has finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub id: String,
}

/// Error body returned by the API on any non-200 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
