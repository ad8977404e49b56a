use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Local authorization role. Only changed through administrative updates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[derive(Default)]
pub enum UserRole {
    #[default]
    User,
    Host,
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Know-your-customer review state. Only changed through administrative updates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
)]
#[sqlx(type_name = "kyc_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[derive(Default)]
pub enum KycStatus {
    #[default]
    NotStarted,
    Pending,
    Verified,
    Rejected,
}

/// Local projection of a provider identity, as stored in `users`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub email_verified: bool,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: UserRole,
    pub kyc_status: KycStatus,
    pub is_active: bool,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a record is first inserted. Role, KYC status and the
/// active flag always start at their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub external_id: String,
    pub email: String,
    pub email_verified: bool,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

impl NewUser {
    pub fn name(&self) -> Option<String> {
        full_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

/// Partial update of a stored record. `None` leaves a column untouched; for
/// nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub phone_number: Option<Option<String>>,
    pub phone_verified: Option<bool>,
    pub name: Option<Option<String>>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub profile_image_url: Option<Option<String>>,
    pub role: Option<UserRole>,
    pub kyc_status: Option<KycStatus>,
    pub is_active: Option<bool>,
    pub last_sign_in_at: Option<Option<DateTime<Utc>>>,
}

impl UserChanges {
    pub fn touches_name(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }
}

/// Space-joined first and last name with empty parts dropped.
pub fn full_name(first_name: Option<&str>, last_name: Option<&str>) -> Option<String> {
    let joined = [first_name, last_name]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() { None } else { Some(joined) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn full_name_joins_both_parts() {
        assert_eq!(full_name(Some("Ana"), Some("Li")), Some("Ana Li".to_string()));
    }

    #[test]
    fn full_name_drops_missing_and_empty_parts() {
        assert_eq!(full_name(None, Some("Li")), Some("Li".to_string()));
        assert_eq!(full_name(Some("Ana"), Some("")), Some("Ana".to_string()));
        assert_eq!(full_name(Some(""), None), None);
        assert_eq!(full_name(None, None), None);
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(UserRole::from_str("HOST").unwrap(), UserRole::Host);
        assert_eq!(UserRole::from_str("admin").unwrap(), UserRole::Admin);
        assert!(UserRole::from_str("superuser").is_err());
    }

    #[test]
    fn kyc_status_uses_snake_case() {
        assert_eq!(KycStatus::NotStarted.as_ref(), "not_started");
        assert_eq!(KycStatus::from_str("not_started").unwrap(), KycStatus::NotStarted);
        assert_eq!(
            serde_json::to_value(KycStatus::Verified).unwrap(),
            serde_json::json!("verified")
        );
    }

    #[test]
    fn defaults_match_new_record_state() {
        assert_eq!(UserRole::default(), UserRole::User);
        assert_eq!(KycStatus::default(), KycStatus::NotStarted);
    }
}
