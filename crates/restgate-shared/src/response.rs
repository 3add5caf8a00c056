//! Standardized API response bodies.

use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code, e.g. `TOKEN_EXPIRED`.
    pub code: String,
    pub message: String,
    /// Id of the request that failed, echoed from `x-request-id`.
    #[serde(rename = "reqId")]
    pub req_id: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>, req_id: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            req_id: req_id.into(),
        }
    }
}

/// Body of a resource list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub list: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(list: Vec<T>) -> Self {
        Self { list }
    }
}
