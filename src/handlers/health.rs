use crate::errors::ServiceError;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub timestamp: String,
}

/// Service health including a database ping
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 500, description = "Database unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    state.db.ping().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        database: "ok",
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Service identity and environment
#[utoipa::path(
    get,
    path = "/api/v1/status",
    responses(
        (status = 200, description = "Service status", body = StatusResponse)
    ),
    tag = "health"
)]
pub async fn api_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatusResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(api_status))
}
