//! Test data factories.
//!
//! Each factory returns a complete, valid value. Use the closure parameter to
//! override specific fields.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{
    provider::{EmailAddress, EventEnvelope, PhoneNumber, ProviderUser, Verification},
    user::{KycStatus, User, UserRole},
};

/// Fixed point in the past, earlier than any `Utc::now()` in a test.
pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn verification(verified: bool) -> Option<Verification> {
    Some(Verification {
        status: if verified { "verified" } else { "unverified" }.to_string(),
        strategy: Some("email_code".to_string()),
    })
}

pub fn email(id: &str, address: &str, verified: bool) -> EmailAddress {
    EmailAddress {
        id: id.to_string(),
        email_address: address.to_string(),
        verification: verification(verified),
    }
}

pub fn phone(id: &str, number: &str, verified: bool) -> PhoneNumber {
    PhoneNumber {
        id: id.to_string(),
        phone_number: number.to_string(),
        verification: verification(verified),
    }
}

/// Provider user `Ana Li <a@b.com>` with a verified primary email `e1`.
pub fn create_test_provider_user(
    id: &str,
    overrides: impl FnOnce(&mut ProviderUser),
) -> ProviderUser {
    let mut user = ProviderUser {
        id: id.to_string(),
        first_name: Some("Ana".to_string()),
        last_name: Some("Li".to_string()),
        primary_email_address_id: Some("e1".to_string()),
        email_addresses: vec![email("e1", "a@b.com", true)],
        created_at: Some(1_704_067_200_000),
        updated_at: Some(1_704_067_200_000),
        ..Default::default()
    };
    overrides(&mut user);
    user
}

/// Stored record matching `create_test_provider_user` with default role,
/// KYC status and timestamps at `test_datetime()`.
pub fn create_test_user(external_id: &str, overrides: impl FnOnce(&mut User)) -> User {
    let mut user = User {
        id: Uuid::new_v4(),
        external_id: external_id.to_string(),
        email: "a@b.com".to_string(),
        email_verified: true,
        phone_number: None,
        phone_verified: false,
        name: Some("Ana Li".to_string()),
        first_name: Some("Ana".to_string()),
        last_name: Some("Li".to_string()),
        profile_image_url: None,
        role: UserRole::User,
        kyc_status: KycStatus::NotStarted,
        is_active: true,
        last_sign_in_at: None,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut user);
    user
}

/// `user.*` delivery carrying the default provider user.
pub fn user_event(event_type: &str, external_id: &str) -> EventEnvelope {
    let data = serde_json::to_value(create_test_provider_user(external_id, |_| {}))
        .expect("provider user serializes");
    serde_json::from_value(json!({ "data": data, "object": "event", "type": event_type }))
        .expect("valid envelope")
}
