//! Payload shapes delivered by the identity provider's webhooks.
//!
//! Only the fields the projection reads are modelled; unknown fields are
//! ignored by serde. Lists the service does not interpret (wallets, linked
//! accounts) are still typed so that a payload change shows up as a parse
//! failure in the logs rather than silently flowing through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Outer envelope of every delivery: `{data, object, type, event_attributes?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub data: serde_json::Value,
    pub object: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_attributes: Option<EventAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_request: Option<HttpRequestAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpRequestAttributes {
    #[serde(default)]
    pub client_ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Event types the router knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
pub enum EventKind {
    #[strum(serialize = "user.created")]
    UserCreated,
    #[strum(serialize = "user.updated")]
    UserUpdated,
    #[strum(serialize = "user.deleted")]
    UserDeleted,
    #[strum(serialize = "session.created")]
    SessionCreated,
    #[strum(serialize = "session.ended")]
    SessionEnded,
    #[strum(serialize = "session.removed")]
    SessionRemoved,
    #[strum(serialize = "session.revoked")]
    SessionRevoked,
}

/// A delivery decoded into the payload its type implies.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    UserCreated(ProviderUser),
    UserUpdated(ProviderUser),
    UserDeleted(DeletedObject),
    SessionCreated(ProviderSession),
    /// `session.ended`, `session.removed` and `session.revoked`.
    SessionClosed(EventKind, ProviderSession),
    Unhandled(String),
}

impl WebhookEvent {
    /// Decodes `data` according to `type`. Unknown types never fail; a known
    /// type with a malformed payload does.
    pub fn from_envelope(envelope: EventEnvelope) -> Result<Self, serde_json::Error> {
        let Ok(kind) = envelope.event_type.parse::<EventKind>() else {
            return Ok(WebhookEvent::Unhandled(envelope.event_type));
        };

        let event = match kind {
            EventKind::UserCreated => WebhookEvent::UserCreated(serde_json::from_value(envelope.data)?),
            EventKind::UserUpdated => WebhookEvent::UserUpdated(serde_json::from_value(envelope.data)?),
            EventKind::UserDeleted => WebhookEvent::UserDeleted(serde_json::from_value(envelope.data)?),
            EventKind::SessionCreated => {
                WebhookEvent::SessionCreated(serde_json::from_value(envelope.data)?)
            }
            EventKind::SessionEnded | EventKind::SessionRemoved | EventKind::SessionRevoked => {
                WebhookEvent::SessionClosed(kind, serde_json::from_value(envelope.data)?)
            }
        };
        Ok(event)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub primary_phone_number_id: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub web3_wallets: Vec<Web3Wallet>,
    #[serde(default)]
    pub external_accounts: Vec<ExternalAccount>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub last_sign_in_at: Option<i64>,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl ProviderUser {
    /// Email entry the provider designates as primary, if the pointer resolves.
    pub fn primary_email(&self) -> Option<&EmailAddress> {
        let primary_id = self.primary_email_address_id.as_deref()?;
        self.email_addresses.iter().find(|e| e.id == primary_id)
    }

    pub fn primary_phone(&self) -> Option<&PhoneNumber> {
        let primary_id = self.primary_phone_number_id.as_deref()?;
        self.phone_numbers.iter().find(|p| p.id == primary_id)
    }

    pub fn profile_image(&self) -> Option<String> {
        self.profile_image_url.clone().filter(|url| !url.is_empty())
    }

    pub fn last_sign_in(&self) -> Option<DateTime<Utc>> {
        self.last_sign_in_at.and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// Banned or locked accounts are projected as inactive.
    pub fn is_active(&self) -> bool {
        !(self.banned || self.locked)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailAddress {
    pub id: String,
    pub email_address: String,
    #[serde(default)]
    pub verification: Option<Verification>,
}

impl EmailAddress {
    pub fn is_verified(&self) -> bool {
        self.verification.as_ref().is_some_and(Verification::is_verified)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub id: String,
    pub phone_number: String,
    #[serde(default)]
    pub verification: Option<Verification>,
}

impl PhoneNumber {
    pub fn is_verified(&self) -> bool {
        self.verification.as_ref().is_some_and(Verification::is_verified)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Verification {
    pub status: String,
    #[serde(default)]
    pub strategy: Option<String>,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        self.status == "verified"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Web3Wallet {
    pub id: String,
    pub web3_wallet: String,
    #[serde(default)]
    pub verification: Option<Verification>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalAccount {
    pub id: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub verification: Option<Verification>,
}

/// `data` of a `user.deleted` delivery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletedObject {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub object: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSession {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_active_at: Option<i64>,
    #[serde(default)]
    pub expire_at: Option<i64>,
}
