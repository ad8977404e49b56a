//! Verification of provider webhook deliveries (Svix signing scheme).
//!
//! The signed content is `{svix-id}.{svix-timestamp}.{raw body}`, MACed with
//! HMAC-SHA256 under the base64 secret that follows the `whsec_` prefix. The
//! `svix-signature` header carries one or more space-separated `v1,<base64>`
//! entries; any match accepts the delivery.

use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::debug;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::provider::EventEnvelope,
    infra::error::InfraError,
};

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";

/// The three delivery headers, all required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl DeliveryHeaders {
    pub fn from_headers(headers: &HeaderMap) -> AppResult<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        match (get(HEADER_ID), get(HEADER_TIMESTAMP), get(HEADER_SIGNATURE)) {
            (Some(id), Some(timestamp), Some(signature)) => Ok(Self { id, timestamp, signature }),
            _ => Err(AppError::InvalidInput("Missing svix headers".into())),
        }
    }
}

pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: &SecretString, tolerance_secs: i64) -> Result<Self, InfraError> {
        let encoded = secret.expose_secret();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| InfraError::WebhookSecret)?;
        Ok(Self { key, tolerance_secs })
    }

    /// Verifies the raw body against the delivery headers and parses it.
    /// Signature and timestamp failures are all `InvalidSignature`.
    pub fn verify(&self, headers: &DeliveryHeaders, body: &str) -> AppResult<EventEnvelope> {
        self.verify_at(headers, body, chrono::Utc::now().timestamp())?;

        serde_json::from_str(body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))
    }

    fn verify_at(&self, headers: &DeliveryHeaders, body: &str, now: i64) -> AppResult<()> {
        let timestamp: i64 = headers.timestamp.trim().parse().map_err(|_| {
            debug!(svix_id = %headers.id, "Unparseable webhook timestamp");
            AppError::InvalidSignature
        })?;

        if now.abs_diff(timestamp) > self.tolerance_secs.unsigned_abs() {
            debug!(svix_id = %headers.id, timestamp, now, "Webhook timestamp outside tolerance");
            return Err(AppError::InvalidSignature);
        }

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| AppError::Internal("HMAC error".into()))?;
        mac.update(signed_content(&headers.id, &headers.timestamp, body).as_bytes());

        let matched = headers
            .signature
            .split(' ')
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == "v1")
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            debug!(svix_id = %headers.id, "Webhook signature mismatch");
            Err(AppError::InvalidSignature)
        }
    }
}

fn signed_content(id: &str, timestamp: &str, body: &str) -> String {
    format!("{}.{}.{}", id, timestamp, body)
}

/// Produces a `v1,<base64>` signature entry, as the provider would.
#[cfg(test)]
pub fn sign_payload(secret: &str, id: &str, timestamp: i64, body: &str) -> String {
    let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
    let key = STANDARD.decode(encoded).unwrap_or_default();
    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC accepts any key length");
    mac.update(signed_content(id, &timestamp.to_string(), body).as_bytes());
    format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes()))
}
