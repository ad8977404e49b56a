//! `TestAppStateBuilder` creates an `AppState` over in-memory fakes for
//! route tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt::TokenVerifier,
        use_cases::{user::UserUseCases, webhook::WebhookUseCases},
    },
    domain::entities::user::User,
    infra::{
        config::{AdminAccess, AppConfig},
        webhook_verifier::WebhookVerifier,
    },
    test_utils::{InMemoryUserRepo, StaticKeyResolver, TEST_ISSUER, TEST_WEBHOOK_SECRET},
};

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        issuer: TEST_ISSUER.to_string(),
        jwks_url: format!("{}/.well-known/jwks.json", TEST_ISSUER)
            .parse()
            .expect("valid url"),
        jwks_cache_ttl_secs: 86_400,
        jwks_min_refresh_secs: 30,
        webhook_secret: SecretString::from(TEST_WEBHOOK_SECRET),
        webhook_tolerance_secs: 300,
        cors_origins: vec![HeaderValue::from_static("http://localhost:3000")],
        admin_access: AdminAccess::AdminRole,
        log_file: None,
    }
}

pub struct TestAppStateBuilder {
    repo: Arc<InMemoryUserRepo>,
    config: AppConfig,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryUserRepo::new()),
            config: test_config(),
        }
    }

    /// Seeds a record into the store right away.
    pub fn with_user(self, user: User) -> Self {
        self.repo.seed(user);
        self
    }

    pub fn with_admin_access(mut self, admin_access: AdminAccess) -> Self {
        self.config.admin_access = admin_access;
        self
    }

    /// Handle on the store the built state will use.
    pub fn repo(&self) -> Arc<InMemoryUserRepo> {
        self.repo.clone()
    }

    pub fn build(self) -> AppState {
        let user_use_cases = Arc::new(UserUseCases::new(self.repo));
        let webhook_use_cases = Arc::new(WebhookUseCases::new(user_use_cases.clone()));
        let token_verifier = Arc::new(TokenVerifier::new(
            Arc::new(StaticKeyResolver::provider()),
            TEST_ISSUER,
        ));
        let webhook_verifier = Arc::new(
            WebhookVerifier::new(&self.config.webhook_secret, self.config.webhook_tolerance_secs)
                .expect("test webhook secret"),
        );

        AppState {
            config: Arc::new(self.config),
            user_use_cases,
            webhook_use_cases,
            token_verifier,
            webhook_verifier,
        }
    }
}
