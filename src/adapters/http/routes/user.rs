use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, patch},
};
use serde::Deserialize;

use crate::{
    adapters::http::{
        app_state::AppState,
        auth::{Authenticated, require_admin, require_owner_or_admin},
        response::ApiResponse,
    },
    app_error::{AppError, AppResult},
    domain::entities::user::{KycStatus, User, UserChanges, UserRole},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/{id}", get(get_user))
        .route("/{id}/role", patch(update_role))
        .route("/{id}/kyc", patch(update_kyc_status))
}

#[derive(Deserialize)]
struct RolePayload {
    #[serde(default)]
    role: Option<String>,
}

#[derive(Deserialize)]
struct KycPayload {
    #[serde(default)]
    kyc_status: Option<String>,
}

/// GET /api/users/profile
async fn get_profile(
    State(app_state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = app_state
        .user_use_cases
        .get_by_external_id(&principal.subject)
        .await?;
    Ok(Json(ApiResponse::data(user)))
}

/// GET /api/users/{id}
/// `id` is the provider user id.
async fn get_user(
    State(app_state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(external_id): Path<String>,
) -> AppResult<Json<ApiResponse<User>>> {
    require_owner_or_admin(&app_state, &principal, &external_id).await?;

    let user = app_state.user_use_cases.get_by_external_id(&external_id).await?;
    Ok(Json(ApiResponse::data(user)))
}

/// PATCH /api/users/{id}/role
async fn update_role(
    State(app_state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(external_id): Path<String>,
    payload: Result<Json<RolePayload>, JsonRejection>,
) -> AppResult<Json<ApiResponse<User>>> {
    require_admin(&app_state, &principal).await?;

    let Json(payload) = payload?;
    let role: UserRole = parse_required(payload.role.as_deref(), "role")?;

    let user = app_state
        .user_use_cases
        .admin_update(&external_id, UserChanges { role: Some(role), ..Default::default() })
        .await?;

    tracing::info!(external_id = %external_id, role = %role, by = %principal.subject, "Role updated");
    Ok(Json(ApiResponse::data(user)))
}

/// PATCH /api/users/{id}/kyc
async fn update_kyc_status(
    State(app_state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(external_id): Path<String>,
    payload: Result<Json<KycPayload>, JsonRejection>,
) -> AppResult<Json<ApiResponse<User>>> {
    require_admin(&app_state, &principal).await?;

    let Json(payload) = payload?;
    let kyc_status: KycStatus = parse_required(payload.kyc_status.as_deref(), "kyc_status")?;

    let user = app_state
        .user_use_cases
        .admin_update(
            &external_id,
            UserChanges { kyc_status: Some(kyc_status), ..Default::default() },
        )
        .await?;

    tracing::info!(
        external_id = %external_id,
        kyc_status = %kyc_status,
        by = %principal.subject,
        "KYC status updated"
    );
    Ok(Json(ApiResponse::data(user)))
}

fn parse_required<T: FromStr>(value: Option<&str>, field: &str) -> AppResult<T> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{} is required", field)))?;
    value
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid {}: {}", field, value)))
}
