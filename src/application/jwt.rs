use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app_error::{AppError, AppResult};

/// Resolves the provider's public signing key for a `kid`.
#[async_trait]
pub trait SigningKeyResolver: Send + Sync {
    async fn resolve(&self, kid: &str) -> AppResult<DecodingKey>;
}

// ============================================================================
// Claims
// ============================================================================

/// Session token claims as issued by the provider. Claims outside the known
/// set land in `extra`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderClaims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub azp: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Claims the service does not interpret. Read-only; handlers that need one of
/// these must ask for it by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimExtensions(serde_json::Map<String, serde_json::Value>);

impl ClaimExtensions {
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(serde_json::Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The authenticated caller, attached to a request after token verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    /// Provider user id; the same value as `users.external_id`.
    pub subject: String,
    pub email: Option<String>,
    pub session_id: Option<String>,
    pub issuer: String,
    pub expires_at: i64,
    pub issued_at: Option<i64>,
    pub authorized_party: Option<String>,
    pub extensions: ClaimExtensions,
}

impl From<ProviderClaims> for Principal {
    fn from(claims: ProviderClaims) -> Self {
        Principal {
            subject: claims.sub,
            email: claims.email,
            session_id: claims.sid,
            issuer: claims.iss,
            expires_at: claims.exp,
            issued_at: claims.iat,
            authorized_party: claims.azp,
            extensions: ClaimExtensions(claims.extra),
        }
    }
}

// ============================================================================
// Verifier
// ============================================================================

pub struct TokenVerifier {
    keys: Arc<dyn SigningKeyResolver>,
    issuer: String,
}

impl TokenVerifier {
    pub fn new(keys: Arc<dyn SigningKeyResolver>, issuer: impl Into<String>) -> Self {
        Self { keys, issuer: issuer.into() }
    }

    /// Verifies signature, expiry and issuer. Every failure, including an
    /// unreachable key endpoint, is reported as `InvalidCredentials`.
    pub async fn verify(&self, token: &str) -> AppResult<Principal> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Rejecting token with malformed header");
            AppError::InvalidCredentials
        })?;

        if header.alg != Algorithm::RS256 {
            debug!(alg = ?header.alg, "Rejecting token with unexpected algorithm");
            return Err(AppError::InvalidCredentials);
        }

        let kid = header.kid.ok_or(AppError::InvalidCredentials)?;

        let key = self.keys.resolve(&kid).await.map_err(|e| {
            warn!(error = %e, kid = %kid, "Signing key lookup failed");
            AppError::InvalidCredentials
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;
        validation.validate_nbf = true;

        decode::<ProviderClaims>(token, &key, &validation)
            .map(|data| Principal::from(data.claims))
            .map_err(|e| {
                debug!(error = %e, "Token verification failed");
                AppError::InvalidCredentials
            })
    }

    /// Required mode: no token or a bad token fails.
    pub async fn authenticate(&self, headers: &HeaderMap) -> AppResult<Principal> {
        let token = bearer_token(headers).ok_or(AppError::InvalidCredentials)?;
        self.verify(token).await
    }

    /// Optional mode: never fails, a missing or bad token yields `None`.
    pub async fn authenticate_optional(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = bearer_token(headers)?;
        self.verify(token).await.ok()
    }
}

/// Token from an `Authorization: Bearer <token>` header. Any other shape,
/// including other schemes or an empty token, counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}
