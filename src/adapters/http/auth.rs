//! Request extractors for the bearer-token gate, plus the admin policy check.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt::Principal,
    infra::config::AdminAccess,
};

/// Required mode: rejects the request with 401 unless a valid token is present.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state
            .token_verifier
            .authenticate(&parts.headers)
            .await
            .map(Authenticated)
    }
}

/// Optional mode: a missing or invalid token just yields `None`.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<Principal>);

impl FromRequestParts<AppState> for MaybeAuthenticated {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthenticated(
            state.token_verifier.authenticate_optional(&parts.headers).await,
        ))
    }
}

/// Enforces the configured admin policy for `principal`.
pub async fn require_admin(state: &AppState, principal: &Principal) -> AppResult<()> {
    match state.config.admin_access {
        AdminAccess::Open => Ok(()),
        AdminAccess::AdminRole => {
            match state.user_use_cases.get_by_external_id(&principal.subject).await {
                Ok(caller) if caller.role.is_admin() && caller.is_active => Ok(()),
                Ok(_) | Err(AppError::NotFound) => {
                    tracing::warn!(external_id = %principal.subject, "Admin route denied");
                    Err(AppError::Forbidden)
                }
                Err(e) => Err(e),
            }
        }
    }
}

/// The record owner always passes; anyone else needs admin access.
pub async fn require_owner_or_admin(
    state: &AppState,
    principal: &Principal,
    external_id: &str,
) -> AppResult<()> {
    if principal.subject == external_id {
        return Ok(());
    }
    require_admin(state, principal).await
}
