//! Wire types for the HTTP API

use serde::{Deserialize, Serialize};

/// `200` body for `POST /execute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub output: String,
}

/// `400`/`500` body for any failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
