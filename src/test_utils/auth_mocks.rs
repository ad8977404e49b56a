//! Fixture signing keys and token minting.
//!
//! `keys/provider_signing.pem` plays the identity provider; its public half is
//! published as `PROVIDER_KEY_N`. `keys/foreign_signing.pem` is an unrelated
//! key for forged tokens.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, encode};
use serde_json::{Value, json};

use crate::{
    app_error::{AppError, AppResult},
    application::jwt::SigningKeyResolver,
};

pub const TEST_ISSUER: &str = "https://clerk.identity-sync.test";
pub const TEST_KID: &str = "ins_test_key_1";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_aWRlbnRpdHktc3luYy10ZXN0LXdlYmhvb2stc2VjcmV0";

const PROVIDER_PEM: &str = include_str!("keys/provider_signing.pem");
const FOREIGN_PEM: &str = include_str!("keys/foreign_signing.pem");

pub const PROVIDER_KEY_N: &str = "tX71PJReNDm7MaOx4IdtAEMEhi1t4wWbyTtTIisv3B2iKqXQ_2h_hytwkOuAE0Yrhp6aFrczwGpV5t7FdHYoVA0zZHcwcKqp5bfLY0Y5KEBvJk7MidGu4UG6LOqBGihD14ju7iMl3HApg5LvXW3n81UhCJ6Y6MaVMOm8i-Ok-IIRQ3_yikzD9UavBmzyaY02i4roxc0ehZAgRjRq-P9ICzAFocHKsmLFDfNCKVH2dLndnG9v2iE9Z3GvMEkwSQ3SdyhUWpWHgW4Mkj1DmHgeQ5M-RZR0Irjvyp0HxYOk3q5OGjNQYpLLRPI3AVBjA_NaZ8PB8LxdBgNAp02T2Wws2w";
pub const PROVIDER_KEY_E: &str = "AQAB";

/// Resolves only `TEST_KID`, to the provider fixture key.
pub struct StaticKeyResolver {
    kid: String,
    key: DecodingKey,
}

impl StaticKeyResolver {
    pub fn provider() -> Self {
        Self {
            kid: TEST_KID.to_string(),
            key: DecodingKey::from_rsa_components(PROVIDER_KEY_N, PROVIDER_KEY_E)
                .expect("fixture key components"),
        }
    }
}

#[async_trait]
impl SigningKeyResolver for StaticKeyResolver {
    async fn resolve(&self, kid: &str) -> AppResult<DecodingKey> {
        if kid == self.kid {
            Ok(self.key.clone())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}

/// JWKS entry for the provider fixture key.
pub fn provider_jwk() -> Value {
    json!({
        "kid": TEST_KID,
        "kty": "RSA",
        "alg": "RS256",
        "use": "sig",
        "n": PROVIDER_KEY_N,
        "e": PROVIDER_KEY_E,
    })
}

/// Valid session claims for `sub`, expiring in an hour.
pub fn test_claims(sub: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": sub,
        "iss": TEST_ISSUER,
        "iat": now,
        "nbf": now - 10,
        "exp": now + 3600,
    })
}

fn mint_with(pem: &str, kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key parses");
    encode(&header, claims, &key).expect("token encodes")
}

pub fn mint_token(kid: &str, claims: &Value) -> String {
    mint_with(PROVIDER_PEM, kid, claims)
}

/// Same shape as `mint_token`, signed with a key the provider never published.
pub fn mint_foreign_token(kid: &str, claims: &Value) -> String {
    mint_with(FOREIGN_PEM, kid, claims)
}
