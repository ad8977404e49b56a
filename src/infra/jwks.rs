//! Provider signing keys, fetched from the JWKS endpoint and cached per `kid`.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::jwt::SigningKeyResolver,
    infra::error::InfraError,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    #[serde(default)]
    kid: Option<String>,
    kty: String,
    #[serde(default, rename = "use")]
    key_use: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

struct CachedKey {
    key: DecodingKey,
    fetched_at: Instant,
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, CachedKey>,
    /// Start of the last fetch attempt, successful or not.
    refreshed_at: Option<Instant>,
}

enum Lookup {
    Hit(DecodingKey),
    Refresh,
    Throttled,
}

pub struct JwksKeyResolver {
    http: Client,
    jwks_url: Url,
    ttl: Duration,
    min_refresh_interval: Duration,
    cache: RwLock<KeyCache>,
}

impl JwksKeyResolver {
    /// `min_refresh_interval` bounds how often an unknown `kid` may trigger a
    /// fetch. Expired entries are always refetched.
    pub fn new(jwks_url: Url, ttl: Duration, min_refresh_interval: Duration) -> Result<Self, InfraError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(InfraError::HttpClient)?;

        Ok(Self {
            http,
            jwks_url,
            ttl,
            min_refresh_interval,
            cache: RwLock::new(KeyCache::default()),
        })
    }

    fn fresh(&self, cache: &KeyCache, kid: &str) -> Option<DecodingKey> {
        cache
            .keys
            .get(kid)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.key.clone())
    }

    async fn cached(&self, kid: &str) -> Option<DecodingKey> {
        let cache = self.cache.read().await;
        self.fresh(&cache, kid)
    }

    /// Decides under the write lock whether this caller may fetch, and if so
    /// stamps the attempt so concurrent unknown kids are throttled.
    async fn claim_refresh(&self, kid: &str) -> Lookup {
        let mut cache = self.cache.write().await;
        if let Some(key) = self.fresh(&cache, kid) {
            return Lookup::Hit(key);
        }

        let known = cache.keys.contains_key(kid);
        let recent = cache
            .refreshed_at
            .is_some_and(|at| at.elapsed() < self.min_refresh_interval);
        if !known && recent {
            return Lookup::Throttled;
        }

        cache.refreshed_at = Some(Instant::now());
        Lookup::Refresh
    }

    /// Fetches the whole key set and replaces the cached keys with it.
    async fn refresh(&self) -> AppResult<()> {
        debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http
            .get(self.jwks_url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "JWKS request failed");
                AppError::Internal("JWKS fetch failed".into())
            })?;

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "JWKS response is not a key set");
            AppError::Internal("JWKS fetch failed".into())
        })?;

        let fetched_at = Instant::now();
        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            if jwk.kty != "RSA" || jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
                continue;
            }
            let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
                continue;
            };
            match DecodingKey::from_rsa_components(&n, &e) {
                Ok(key) => {
                    keys.insert(kid, CachedKey { key, fetched_at });
                }
                Err(e) => warn!(error = %e, kid = %kid, "Skipping unparseable JWKS key"),
            }
        }

        info!(count = keys.len(), "Loaded JWKS keys");
        self.cache.write().await.keys = keys;
        Ok(())
    }
}

#[async_trait]
impl SigningKeyResolver for JwksKeyResolver {
    async fn resolve(&self, kid: &str) -> AppResult<DecodingKey> {
        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }

        match self.claim_refresh(kid).await {
            Lookup::Hit(key) => return Ok(key),
            Lookup::Throttled => {
                debug!(kid = %kid, "Unknown kid, JWKS refreshed recently");
                return Err(AppError::InvalidCredentials);
            }
            Lookup::Refresh => self.refresh().await?,
        }

        self.cached(kid).await.ok_or_else(|| {
            debug!(kid = %kid, "No signing key for kid");
            AppError::InvalidCredentials
        })
    }
}
