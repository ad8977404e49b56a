use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::adapters::http::app_state::AppState;

pub const SERVICE_NAME: &str = "identity-sync";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness))
        .route("/db", get(database))
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// GET /api/health
async fn liveness() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": now(),
    }))
}

/// GET /api/health/db
async fn database(State(app_state): State<AppState>) -> Response {
    match app_state.user_use_cases.check_database().await {
        Ok(()) => Json(json!({
            "success": true,
            "status": "healthy",
            "database": "connected",
            "timestamp": now(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "status": "unhealthy",
                    "database": "disconnected",
                    "error": e.to_string(),
                    "timestamp": now(),
                })),
            )
                .into_response()
        }
    }
}
