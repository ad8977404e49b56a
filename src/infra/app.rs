use axum::{Json, Router, http, routing::get};
use http::{
    HeaderName,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    adapters::{
        self,
        http::{app_state::AppState, response::ApiResponse},
    },
    infra::webhook_verifier::{HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP},
};

pub fn create_app(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origins.clone())
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(HEADER_ID),
            HeaderName::from_static(HEADER_TIMESTAMP),
            HeaderName::from_static(HEADER_SIGNATURE),
        ])
        .allow_credentials(true);

    Router::new()
        .route("/", get(adapters::http::routes::root))
        .nest("/api", adapters::http::routes::router())
        .fallback(not_found)
        .with_state(app_state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http-request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    request_id = %request_id
                )
            }),
        )
}

async fn not_found() -> (http::StatusCode, Json<ApiResponse<()>>) {
    (
        http::StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Endpoint not found")),
    )
}
