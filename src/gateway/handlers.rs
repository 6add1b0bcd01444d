//! Request handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::types::{ErrorResponse, ExecuteResponse};
use super::AppState;
use crate::error::Error;
use crate::sandbox::ExecutionRequest;

/// Maps crate errors onto 400/500 JSON bodies
pub struct AppError(Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(Error::InvalidInput(rejection.body_text()))
    }
}

/// `POST /execute`
pub async fn execute(
    State(state): State<AppState>,
    payload: Result<Json<ExecutionRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, AppError> {
    let Json(request) = payload.inspect_err(|e| warn!("Rejected request body: {}", e))?;

    info!(
        "Execute request: language={}, code_len={}",
        request.language.as_deref().unwrap_or("<missing>"),
        request.code.as_deref().map_or(0, str::len)
    );

    // Detached from the request future: removal must run even after a disconnect
    let gateway = Arc::clone(&state.gateway);
    let outcome = tokio::spawn(async move { gateway.execute(&request).await })
        .await
        .unwrap_or_else(|e| Err(Error::Internal(format!("Execution task failed: {}", e))));

    match outcome {
        Ok(result) => {
            info!(
                "Execution finished: exit_code={}, time={:?}",
                result.exit_code, result.execution_time
            );
            Ok(Json(ExecuteResponse {
                output: result.output,
            }))
        }
        Err(e) if e.is_client_error() => {
            warn!("Invalid execute request: {}", e);
            Err(e.into())
        }
        Err(e) => {
            error!("Execution failed: {}", e);
            Err(e.into())
        }
    }
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}
