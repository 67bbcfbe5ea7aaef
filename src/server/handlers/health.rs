//! Liveness probe.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::super::AppState;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub storage_configured: bool,
}

/// 200 when the database answers, 503 otherwise. Storage only informs the body.
pub async fn health(State(state): State<AppState>) -> Response {
    let database_ok = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            false
        }
    };
    let storage_configured = state.settings.storage.with_env_overrides().remote_configured();

    let (status, body) = if database_ok {
        (
            StatusCode::OK,
            HealthResponse {
                status: "healthy",
                database: "connected",
                storage_configured,
            },
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthResponse {
                status: "unhealthy",
                database: "unreachable",
                storage_configured,
            },
        )
    };

    (status, Json(body)).into_response()
}
