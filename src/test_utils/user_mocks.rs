//! In-memory user store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::user::UserRepo,
    domain::entities::user::{KycStatus, NewUser, User, UserChanges, UserRole},
};

/// Applies `changes` the way the SQL update does: `None` leaves a column
/// alone, `Some(None)` clears a nullable one. `updated_at` is left to the caller.
pub fn apply_changes(changes: &UserChanges, user: &mut User) {
    fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
        if let Some(v) = value {
            *slot = v.clone();
        }
    }

    set(&mut user.email, &changes.email);
    set(&mut user.email_verified, &changes.email_verified);
    set(&mut user.phone_number, &changes.phone_number);
    set(&mut user.phone_verified, &changes.phone_verified);
    set(&mut user.name, &changes.name);
    set(&mut user.first_name, &changes.first_name);
    set(&mut user.last_name, &changes.last_name);
    set(&mut user.profile_image_url, &changes.profile_image_url);
    set(&mut user.role, &changes.role);
    set(&mut user.kyc_status, &changes.kyc_status);
    set(&mut user.is_active, &changes.is_active);
    set(&mut user.last_sign_in_at, &changes.last_sign_in_at);
}

/// `UserRepo` over a map keyed by `external_id`. `set_unavailable(true)`
/// makes every call fail like a lost database connection.
#[derive(Default)]
pub struct InMemoryUserRepo {
    users: Mutex<HashMap<String, User>>,
    unavailable: AtomicBool,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, user: User) {
        self.users
            .lock()
            .unwrap()
            .insert(user.external_id.clone(), user);
    }

    pub fn get(&self, external_id: &str) -> Option<User> {
        self.users.lock().unwrap().get(external_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AppError::Database("Database operation failed".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn get_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        self.check_available()?;
        Ok(self.get(external_id))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.check_available()?;
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|u| u.email == email)
            .min_by_key(|u| u.created_at)
            .cloned())
    }

    async fn insert(&self, new_user: &NewUser) -> AppResult<User> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&new_user.external_id) {
            return Err(AppError::AlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            external_id: new_user.external_id.clone(),
            email: new_user.email.clone(),
            email_verified: new_user.email_verified,
            phone_number: new_user.phone_number.clone(),
            phone_verified: new_user.phone_verified,
            name: new_user.name(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            profile_image_url: new_user.profile_image_url.clone(),
            role: UserRole::default(),
            kyc_status: KycStatus::default(),
            is_active: true,
            last_sign_in_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.external_id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, external_id: &str, changes: &UserChanges) -> AppResult<User> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(external_id).ok_or(AppError::NotFound)?;
        apply_changes(changes, user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, external_id: &str) -> AppResult<bool> {
        self.check_available()?;
        Ok(self.users.lock().unwrap().remove(external_id).is_some())
    }

    async fn ping(&self) -> AppResult<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;

    #[test]
    fn changes_leave_unset_fields_alone_and_clear_explicit_nulls() {
        let mut user = create_test_user("u1", |u| {
            u.phone_number = Some("+100".into());
            u.phone_verified = true;
        });

        let changes = UserChanges {
            phone_number: Some(None),
            role: Some(UserRole::Host),
            ..Default::default()
        };
        apply_changes(&changes, &mut user);

        assert_eq!(user.phone_number, None);
        assert_eq!(user.role, UserRole::Host);
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.name.as_deref(), Some("Ana Li"));
        assert!(user.phone_verified);
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let repo = InMemoryUserRepo::new();
        let before = create_test_user("u1", |_| {});
        repo.seed(before.clone());

        let updated = repo
            .update("u1", &UserChanges { is_active: Some(false), ..Default::default() })
            .await
            .unwrap();

        assert!(!updated.is_active);
        assert!(updated.updated_at > before.updated_at);
    }
}
