// handlers/public/health.rs - GET /api/health handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::warn;

use crate::app::AppState;

/// GET /api/health - liveness plus a document store ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.repository.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "OK",
                "message": "API funcionando corretamente",
                "database": "ok",
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed to reach the document store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "message": "Banco de dados indisponível",
                    "database": "unavailable",
                })),
            )
        }
    }
}
