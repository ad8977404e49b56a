use std::sync::Arc;

use crate::{
    application::{
        jwt::TokenVerifier,
        use_cases::{user::UserUseCases, webhook::WebhookUseCases},
    },
    infra::{config::AppConfig, webhook_verifier::WebhookVerifier},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub user_use_cases: Arc<UserUseCases>,
    pub webhook_use_cases: Arc<WebhookUseCases>,
    pub token_verifier: Arc<TokenVerifier>,
    pub webhook_verifier: Arc<WebhookVerifier>,
}
