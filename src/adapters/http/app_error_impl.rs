use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{adapters::http::response::ApiResponse, app_error::AppError};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = ?self, "Request failed");
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::InvalidCredentials => {
                tracing::warn!(error = %self, "Request rejected");
                error_resp(StatusCode::UNAUTHORIZED, "Authentication required")
            }
            AppError::Forbidden => {
                tracing::warn!(error = %self, "Request rejected");
                error_resp(StatusCode::FORBIDDEN, "Forbidden")
            }
            AppError::InvalidInput(msg) => {
                tracing::warn!(error = %msg, "Request rejected");
                error_resp(StatusCode::BAD_REQUEST, msg)
            }
            AppError::InvalidSignature => {
                tracing::warn!(error = %self, "Request rejected");
                error_resp(StatusCode::BAD_REQUEST, "Invalid webhook signature")
            }
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, "Not found"),
            AppError::AlreadyExists => {
                tracing::warn!(error = %self, "Request rejected");
                error_resp(StatusCode::CONFLICT, "Already exists")
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "Rejected JSON body");
        AppError::InvalidInput("Invalid JSON body".into())
    }
}

fn error_resp(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::error(message))).into_response()
}
