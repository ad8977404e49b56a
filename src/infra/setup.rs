use std::{fs::File, sync::Arc, time::Duration};

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt::TokenVerifier,
        use_cases::{
            user::{UserRepo, UserUseCases},
            webhook::WebhookUseCases,
        },
    },
    infra::{
        config::AppConfig, error::InfraError, jwks::JwksKeyResolver, postgres_persistence,
        webhook_verifier::WebhookVerifier,
    },
};

pub async fn init_app_state(config: AppConfig) -> Result<AppState, InfraError> {
    let postgres_arc =
        Arc::new(postgres_persistence(&config.database_url, config.database_max_connections).await?);
    let user_repo_arc = postgres_arc as Arc<dyn UserRepo>;

    let user_use_cases = Arc::new(UserUseCases::new(user_repo_arc));
    let webhook_use_cases = Arc::new(WebhookUseCases::new(user_use_cases.clone()));

    let key_resolver = JwksKeyResolver::new(
        config.jwks_url.clone(),
        Duration::from_secs(config.jwks_cache_ttl_secs),
        Duration::from_secs(config.jwks_min_refresh_secs),
    )?;
    let token_verifier = Arc::new(TokenVerifier::new(Arc::new(key_resolver), config.issuer.clone()));

    let webhook_verifier = Arc::new(WebhookVerifier::new(
        &config.webhook_secret,
        config.webhook_tolerance_secs,
    )?);

    Ok(AppState {
        config: Arc::new(config),
        user_use_cases,
        webhook_use_cases,
        token_verifier,
        webhook_verifier,
    })
}

pub fn init_tracing(log_file: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "identity_sync=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), skipped when the file cannot be created
    let mut file_error = None;
    let json_layer = log_file.and_then(|path| match File::create(path) {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            file_error = Some((path.to_string(), e));
            None
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    if let Some((path, e)) = file_error {
        warn!(path = %path, error = %e, "Cannot create log file, logging to console only");
    }
}
