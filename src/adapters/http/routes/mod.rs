pub mod health;
pub mod user;
pub mod webhook;

use axum::{Json, Router, extract::State};
use serde_json::json;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/health", health::router())
        .nest("/webhooks", webhook::router())
        .nest("/users", user::router())
}

/// GET /
/// `admin_access` tells clients whether PATCH routes check the caller's role
/// before the payload.
pub async fn root(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Identity sync service",
        "version": env!("CARGO_PKG_VERSION"),
        "admin_access": app_state.config.admin_access.as_ref(),
        "endpoints": {
            "health": "/api/health",
            "webhooks": "/api/webhooks/clerk/webhook",
            "users": "/api/users",
        },
    }))
}
