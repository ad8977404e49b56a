use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        provider::ProviderUser,
        user::{NewUser, User, UserChanges, full_name},
    },
};

/// Persistence port for projected user records. Every lookup and mutation is
/// keyed by the provider-issued `external_id`.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_external_id(&self, external_id: &str) -> AppResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Fails with `AppError::AlreadyExists` when `external_id` is taken.
    async fn insert(&self, user: &NewUser) -> AppResult<User>;
    /// Applies `changes` and refreshes `updated_at`. Fails with
    /// `AppError::NotFound` when no record matches.
    async fn update(&self, external_id: &str, changes: &UserChanges) -> AppResult<User>;
    /// Returns whether a record was removed.
    async fn delete(&self, external_id: &str) -> AppResult<bool>;
    async fn ping(&self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct UserUseCases {
    repo: Arc<dyn UserRepo>,
}

impl UserUseCases {
    pub fn new(repo: Arc<dyn UserRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn get_by_external_id(&self, external_id: &str) -> AppResult<User> {
        self.repo
            .get_by_external_id(external_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> AppResult<User> {
        self.repo.get_by_email(email).await?.ok_or(AppError::NotFound)
    }

    /// Inserts a record for a provider user. A user without a resolvable
    /// primary email is rejected.
    #[instrument(skip(self, provider_user), fields(external_id = %provider_user.id))]
    pub async fn create_from_provider(&self, provider_user: &ProviderUser) -> AppResult<User> {
        let primary_email = provider_user.primary_email().ok_or_else(|| {
            AppError::InvalidInput("Provider user has no primary email address".into())
        })?;
        let primary_phone = provider_user.primary_phone();

        let new_user = NewUser {
            external_id: provider_user.id.clone(),
            email: primary_email.email_address.clone(),
            email_verified: primary_email.is_verified(),
            phone_number: primary_phone.map(|p| p.phone_number.clone()),
            phone_verified: primary_phone.is_some_and(|p| p.is_verified()),
            first_name: provider_user.first_name.clone(),
            last_name: provider_user.last_name.clone(),
            profile_image_url: provider_user.profile_image(),
        };

        self.repo.insert(&new_user).await
    }

    /// Re-projects a provider user onto an existing record. Email and phone
    /// are left as stored when the payload has no resolvable primary entry.
    #[instrument(skip(self, provider_user), fields(external_id = %provider_user.id))]
    pub async fn update_from_provider(&self, provider_user: &ProviderUser) -> AppResult<User> {
        if self.repo.get_by_external_id(&provider_user.id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let primary_email = provider_user.primary_email();
        let primary_phone = provider_user.primary_phone();

        let changes = UserChanges {
            email: primary_email.map(|e| e.email_address.clone()),
            email_verified: primary_email.map(|e| e.is_verified()),
            phone_number: primary_phone.map(|p| Some(p.phone_number.clone())),
            phone_verified: primary_phone.map(|p| p.is_verified()),
            name: Some(full_name(
                provider_user.first_name.as_deref(),
                provider_user.last_name.as_deref(),
            )),
            first_name: Some(provider_user.first_name.clone()),
            last_name: Some(provider_user.last_name.clone()),
            profile_image_url: Some(provider_user.profile_image()),
            is_active: Some(provider_user.is_active()),
            last_sign_in_at: Some(provider_user.last_sign_in()),
            ..Default::default()
        };

        self.repo.update(&provider_user.id, &changes).await
    }

    /// `user.created`: create, falling back to update when the record exists
    /// (duplicate or out-of-order delivery).
    pub async fn sync_created(&self, provider_user: &ProviderUser) -> AppResult<User> {
        match self.create_from_provider(provider_user).await {
            Err(AppError::AlreadyExists) => {
                info!(external_id = %provider_user.id, "User already exists, updating instead");
                self.update_from_provider(provider_user).await
            }
            other => other,
        }
    }

    /// `user.updated`: update, falling back to create when the record is
    /// missing (the create delivery was lost or has not arrived yet).
    pub async fn sync_updated(&self, provider_user: &ProviderUser) -> AppResult<User> {
        match self.update_from_provider(provider_user).await {
            Err(AppError::NotFound) => {
                info!(external_id = %provider_user.id, "User not found, creating instead");
                self.create_from_provider(provider_user).await
            }
            other => other,
        }
    }

    /// Marks the record inactive. A missing record is logged, not an error.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, external_id: &str) -> AppResult<()> {
        let changes = UserChanges { is_active: Some(false), ..Default::default() };
        match self.repo.update(external_id, &changes).await {
            Ok(_) => Ok(()),
            Err(AppError::NotFound) => {
                warn!(external_id, "Soft delete for unknown user ignored");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Removes the record entirely. No route or event triggers this.
    #[instrument(skip(self))]
    pub async fn delete_permanently(&self, external_id: &str) -> AppResult<()> {
        if self.repo.delete(external_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    /// Administrative update of any mutable fields. `name` is re-derived when
    /// either name part changes.
    #[instrument(skip(self, changes))]
    pub async fn admin_update(&self, external_id: &str, changes: UserChanges) -> AppResult<User> {
        let existing = self.get_by_external_id(external_id).await?;

        let mut changes = changes;
        if changes.touches_name() && changes.name.is_none() {
            let first = changes.first_name.clone().unwrap_or(existing.first_name);
            let last = changes.last_name.clone().unwrap_or(existing.last_name);
            changes.name = Some(full_name(first.as_deref(), last.as_deref()));
        }

        self.repo.update(external_id, &changes).await
    }

    /// Stamps `last_sign_in_at` with the current time.
    #[instrument(skip(self))]
    pub async fn record_sign_in(&self, external_id: &str) -> AppResult<User> {
        let changes = UserChanges {
            last_sign_in_at: Some(Some(Utc::now())),
            ..Default::default()
        };
        self.repo.update(external_id, &changes).await
    }

    pub async fn check_database(&self) -> AppResult<()> {
        self.repo.ping().await
    }
}
