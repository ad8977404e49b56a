use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use strum::{AsRefStr, Display, EnumString};
use url::Url;

/// Who may use the administrative routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AdminAccess {
    /// Any authenticated caller.
    Open,
    /// Only callers whose own record has `role = admin`. The check runs
    /// before the body is validated, so a non-admin sending an invalid
    /// payload gets 403 rather than 400.
    #[default]
    AdminRole,
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Expected `iss` claim of session tokens.
    pub issuer: String,
    pub jwks_url: Url,
    pub jwks_cache_ttl_secs: u64,
    /// Floor between JWKS fetches triggered by an unknown `kid`.
    pub jwks_min_refresh_secs: u64,
    pub webhook_secret: SecretString,
    /// Allowed distance between `svix-timestamp` and now.
    pub webhook_tolerance_secs: i64,
    pub cors_origins: Vec<HeaderValue>,
    pub admin_access: AdminAccess,
    pub log_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let database_url: String = get_env("DATABASE_URL");
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 5);

        let issuer: String = get_env::<String>("CLERK_ISSUER_URL")
            .trim_end_matches('/')
            .to_string();
        let jwks_url: Url = match std::env::var("CLERK_JWKS_URL") {
            Ok(url) if !url.is_empty() => url.parse().expect("CLERK_JWKS_URL must be a valid URL"),
            _ => default_jwks_url(&issuer),
        };
        let jwks_cache_ttl_secs: u64 = get_env_default("JWKS_CACHE_TTL_SECS", 86_400);
        let jwks_min_refresh_secs: u64 = get_env_default("JWKS_MIN_REFRESH_SECS", 30);

        let webhook_secret = SecretString::from(get_env::<String>("CLERK_WEBHOOK_SECRET"));
        let webhook_tolerance_secs: i64 = get_env_default("WEBHOOK_TOLERANCE_SECS", 300);

        let cors_origins = parse_origins(&get_env_default(
            "CORS_ORIGINS",
            String::from("http://localhost:3000"),
        ));
        let admin_access: AdminAccess = get_env_default("ADMIN_ACCESS", AdminAccess::default());

        let log_file: String = get_env_default("LOG_FILE", String::from("app.log"));
        let log_file = (!log_file.is_empty()).then_some(log_file);

        Self {
            bind_addr,
            database_url,
            database_max_connections,
            issuer,
            jwks_url,
            jwks_cache_ttl_secs,
            jwks_min_refresh_secs,
            webhook_secret,
            webhook_tolerance_secs,
            cors_origins,
            admin_access,
            log_file,
        }
    }
}

fn default_jwks_url(issuer: &str) -> Url {
    format!("{}/.well-known/jwks.json", issuer)
        .parse()
        .expect("CLERK_ISSUER_URL must be a valid URL")
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            o.parse()
                .expect("CORS_ORIGINS entries must be valid header values")
        })
        .collect()
}
