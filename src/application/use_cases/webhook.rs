//! Routes verified provider deliveries to the projection service.
//!
//! Deliveries are acknowledged once verified; `dispatch` runs afterwards and
//! reports the outcome only through logs. A delivery is therefore attempted
//! at most once by this service, and the provider never sees handler
//! failures.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::{
    app_error::AppResult,
    application::use_cases::user::UserUseCases,
    domain::entities::provider::{
        DeletedObject, EventEnvelope, EventKind, ProviderSession, ProviderUser, WebhookEvent,
    },
};

/// What happened to a dispatched delivery, for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    Ignored,
    Failed,
}

#[derive(Clone)]
pub struct WebhookUseCases {
    users: Arc<UserUseCases>,
}

impl WebhookUseCases {
    pub fn new(users: Arc<UserUseCases>) -> Self {
        Self { users }
    }

    /// Decodes and handles one delivery. Never returns an error.
    #[instrument(skip(self, envelope), fields(event_type = %envelope.event_type))]
    pub async fn dispatch(&self, envelope: EventEnvelope) -> DispatchOutcome {
        let event_type = envelope.event_type.clone();
        info!("Webhook received");

        let event = match WebhookEvent::from_envelope(envelope) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Webhook payload does not match its event type");
                return DispatchOutcome::Failed;
            }
        };

        let result = match event {
            WebhookEvent::UserCreated(user) => self.handle_user_created(&user).await,
            WebhookEvent::UserUpdated(user) => self.handle_user_updated(&user).await,
            WebhookEvent::UserDeleted(deleted) => self.handle_user_deleted(&deleted).await,
            WebhookEvent::SessionCreated(session) => {
                self.handle_session_created(&session).await;
                Ok(())
            }
            WebhookEvent::SessionClosed(kind, session) => {
                handle_session_closed(kind, &session);
                Ok(())
            }
            WebhookEvent::Unhandled(_) => {
                info!("Unhandled webhook event type, ignoring");
                return DispatchOutcome::Ignored;
            }
        };

        match result {
            Ok(()) => DispatchOutcome::Applied,
            Err(e) => {
                error!(error = %e, event_type = %event_type, "Webhook handler failed");
                DispatchOutcome::Failed
            }
        }
    }

    async fn handle_user_created(&self, user: &ProviderUser) -> AppResult<()> {
        let record = self.users.sync_created(user).await?;
        info!(user_id = %record.id, external_id = %record.external_id, "User synced from user.created");
        Ok(())
    }

    async fn handle_user_updated(&self, user: &ProviderUser) -> AppResult<()> {
        let record = self.users.sync_updated(user).await?;
        info!(user_id = %record.id, external_id = %record.external_id, "User synced from user.updated");
        Ok(())
    }

    async fn handle_user_deleted(&self, deleted: &DeletedObject) -> AppResult<()> {
        self.users.soft_delete(&deleted.id).await?;
        info!(external_id = %deleted.id, "User deactivated");
        Ok(())
    }

    /// Missing users are expected here (sessions can outlive the sync), so
    /// failures stay inside the handler.
    async fn handle_session_created(&self, session: &ProviderSession) {
        match self.users.record_sign_in(&session.user_id).await {
            Ok(_) => info!(session_id = %session.id, external_id = %session.user_id, "Sign-in recorded"),
            Err(e) => warn!(
                error = %e,
                session_id = %session.id,
                external_id = %session.user_id,
                "Failed to record sign-in"
            ),
        }
    }
}

fn handle_session_closed(kind: EventKind, session: &ProviderSession) {
    info!(
        kind = %kind,
        session_id = %session.id,
        external_id = %session.user_id,
        "Session closed"
    );
}
