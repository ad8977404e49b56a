use axum::{Json, Router, body::Bytes, extract::State, http::HeaderMap, routing::post};
use tracing::{Instrument, info};

use crate::{
    adapters::http::{app_state::AppState, response::ApiResponse},
    app_error::{AppError, AppResult},
    infra::webhook_verifier::DeliveryHeaders,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/clerk/webhook", post(clerk_webhook))
}

/// POST /api/webhooks/clerk/webhook
/// The body is taken as the raw bytes that were signed. Processing happens
/// after the response, so handler failures never reach the provider.
async fn clerk_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<()>>> {
    let delivery = DeliveryHeaders::from_headers(&headers)?;
    let body = std::str::from_utf8(&body)
        .map_err(|_| AppError::InvalidInput("Webhook body is not valid UTF-8".into()))?;
    let envelope = app_state.webhook_verifier.verify(&delivery, body)?;

    info!(svix_id = %delivery.id, event_type = %envelope.event_type, "Webhook verified");

    let webhooks = app_state.webhook_use_cases.clone();
    tokio::spawn(
        async move {
            webhooks.dispatch(envelope).await;
        }
        .instrument(tracing::Span::current()),
    );

    Ok(Json(ApiResponse::message("Webhook processed")))
}
