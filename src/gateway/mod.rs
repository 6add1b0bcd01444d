//! HTTP gateway - axum router in front of the execution gateway
//!
//! ```text
//! POST /execute  {language, code}  ->  200 {output} | 400 {error} | 500 {error}
//! GET  /health                     ->  200 OK
//! ```

mod handlers;
mod types;

pub use handlers::AppError;
pub use types::{ErrorResponse, ExecuteResponse};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::sandbox::ExecutionGateway;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ExecutionGateway>,
}

/// Build the application router
pub fn build_router(gateway: Arc<ExecutionGateway>) -> Router {
    Router::new()
        .route("/execute", post(handlers::execute))
        .route("/health", get(handlers::health))
        .with_state(AppState { gateway })
        .layer(CorsLayer::permissive())
}
