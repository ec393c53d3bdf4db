//! API Router and Application State
//!
//! Central routing configuration and shared state.

pub mod handlers;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::Config, service::PermissionService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Grant stores and settings
    pub service: Arc<PermissionService>,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(service: PermissionService, config: Arc<Config>) -> Self {
        Self {
            service: Arc::new(service),
            config,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/api/commands", post(handlers::run_command))
        .route(
            "/api/communities/{community_id}/authorization",
            get(handlers::community_authorization),
        )
        .route(
            "/api/communities/{community_id}/checks",
            post(handlers::check_grant),
        );

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(api_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
