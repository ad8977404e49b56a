use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::user::UserRepo,
    domain::entities::user::{KycStatus, NewUser, User, UserChanges, UserRole},
};

const USER_COLUMNS: &str = "id, external_id, email, email_verified, phone_number, phone_verified, \
     name, first_name, last_name, profile_image_url, role, kyc_status, is_active, \
     last_sign_in_at, created_at, updated_at";

/// Splits a "maybe set, maybe null" field into the flag/value pair bound by
/// the `CASE WHEN $flag THEN $value ELSE column END` pattern.
fn nullable<T: Clone>(change: &Option<Option<T>>) -> (bool, Option<T>) {
    match change {
        Some(value) => (true, value.clone()),
        None => (false, None),
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 ORDER BY created_at ASC LIMIT 1"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn insert(&self, user: &NewUser) -> AppResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (
                id, external_id, email, email_verified, phone_number, phone_verified,
                name, first_name, last_name, profile_image_url, role, kyc_status, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, TRUE)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.external_id)
            .bind(&user.email)
            .bind(user.email_verified)
            .bind(&user.phone_number)
            .bind(user.phone_verified)
            .bind(user.name())
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.profile_image_url)
            .bind(UserRole::default())
            .bind(KycStatus::default())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn update(&self, external_id: &str, changes: &UserChanges) -> AppResult<User> {
        let (set_phone, phone_number) = nullable(&changes.phone_number);
        let (set_name, name) = nullable(&changes.name);
        let (set_first, first_name) = nullable(&changes.first_name);
        let (set_last, last_name) = nullable(&changes.last_name);
        let (set_image, profile_image_url) = nullable(&changes.profile_image_url);
        let (set_sign_in, last_sign_in_at) = nullable(&changes.last_sign_in_at);

        let sql = format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                email_verified = COALESCE($3, email_verified),
                phone_number = CASE WHEN $4 THEN $5 ELSE phone_number END,
                phone_verified = COALESCE($6, phone_verified),
                name = CASE WHEN $7 THEN $8 ELSE name END,
                first_name = CASE WHEN $9 THEN $10 ELSE first_name END,
                last_name = CASE WHEN $11 THEN $12 ELSE last_name END,
                profile_image_url = CASE WHEN $13 THEN $14 ELSE profile_image_url END,
                role = COALESCE($15, role),
                kyc_status = COALESCE($16, kyc_status),
                is_active = COALESCE($17, is_active),
                last_sign_in_at = CASE WHEN $18 THEN $19 ELSE last_sign_in_at END,
                updated_at = CURRENT_TIMESTAMP
            WHERE external_id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(external_id)
            .bind(&changes.email)
            .bind(changes.email_verified)
            .bind(set_phone)
            .bind(phone_number)
            .bind(changes.phone_verified)
            .bind(set_name)
            .bind(name)
            .bind(set_first)
            .bind(first_name)
            .bind(set_last)
            .bind(last_name)
            .bind(set_image)
            .bind(profile_image_url)
            .bind(changes.role)
            .bind(changes.kyc_status)
            .bind(changes.is_active)
            .bind(set_sign_in)
            .bind(last_sign_in_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?
            .ok_or(AppError::NotFound)
    }

    async fn delete(&self, external_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE external_id = $1")
            .bind(external_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
