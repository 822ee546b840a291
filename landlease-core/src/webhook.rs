//! Identity-provider webhooks: signature verification and event parsing.
//!
//! Deliveries are signed the Svix way. The signed content is
//! `"{id}.{timestamp}.{body}"`, MACed with HMAC-SHA256 under the
//! base64-decoded secret (the part after `whsec_`). The signature header
//! holds one or more space-separated `v1,<base64>` entries.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{Error, Result};

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Default allowed clock skew between sender and receiver
pub const DEFAULT_TOLERANCE_SECS: i64 = 5 * 60;

/// The three signature headers of one delivery
#[derive(Debug, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

/// Verifies deliveries against the shared secret
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance: Duration,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"<redacted>")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl WebhookVerifier {
    /// Build from a `whsec_<base64>` secret (the prefix is optional)
    pub fn new(secret: &str) -> Result<Self> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        if encoded.is_empty() {
            return Err(Error::InvalidSecret("secret is empty".into()));
        }
        let key = STANDARD.decode(encoded)?;
        Ok(Self {
            key,
            tolerance: Duration::seconds(DEFAULT_TOLERANCE_SECS),
        })
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Compute the `v1,<base64>` signature for a delivery
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> Result<String> {
        let mac = self.mac(id, &timestamp.to_string(), body)?;
        Ok(format!("{},{}", SIGNATURE_VERSION, STANDARD.encode(mac)))
    }

    /// Verify a delivery against the current time
    pub fn verify(&self, headers: &WebhookHeaders<'_>, body: &[u8]) -> Result<()> {
        self.verify_at(headers, body, Utc::now())
    }

    /// Verify a delivery against a given time
    pub fn verify_at(
        &self,
        headers: &WebhookHeaders<'_>,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<()> {
        if headers.id.is_empty() {
            return Err(Error::MissingHeader(HEADER_ID));
        }
        if headers.signature.trim().is_empty() {
            return Err(Error::MissingHeader(HEADER_SIGNATURE));
        }

        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| Error::InvalidTimestamp(headers.timestamp.to_string()))?;
        // Saturates for timestamps far outside the representable range
        let skew = now.timestamp().checked_sub(timestamp).unwrap_or(i64::MAX);
        if skew.unsigned_abs() > self.tolerance.num_seconds().unsigned_abs() {
            return Err(Error::TimestampOutOfTolerance { skew_secs: skew });
        }

        let expected = self.mac(headers.id, headers.timestamp.trim(), body)?;

        // Any one valid v1 entry is enough; unknown versions are skipped
        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|sig| bool::from(sig.ct_eq(&expected)));

        if matched {
            Ok(())
        } else {
            Err(Error::SignatureVerificationFailed)
        }
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<Vec<u8>> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&self.key)
            .map_err(|e| Error::InvalidSecret(e.to_string()))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// One email address on an identity-provider user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEmail {
    pub id: String,
    pub email_address: String,
}

/// User object carried by `user.*` events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<IdentityEmail>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl IdentityUser {
    /// Primary email, falling back to the first listed one
    pub fn primary_email(&self) -> Option<&str> {
        self.primary_email_address_id
            .as_deref()
            .and_then(|primary| self.email_addresses.iter().find(|e| e.id == primary))
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.as_str())
    }

    /// "First Last", or the primary email when no name is set
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.primary_email().unwrap_or_default().to_string()
        } else {
            name
        }
    }
}

/// Lifecycle event from the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    UserCreated(IdentityUser),
    UserUpdated(IdentityUser),
    UserDeleted { id: String },
    /// Anything else; acknowledged but not acted on
    Unhandled(String),
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct DeletedUser {
    id: String,
}

impl IdentityEvent {
    /// Parse a verified delivery body
    pub fn parse(body: &[u8]) -> Result<Self> {
        let raw: RawEvent = serde_json::from_slice(body)?;
        let event = match raw.event_type.as_str() {
            "user.created" => IdentityEvent::UserCreated(serde_json::from_value(raw.data)?),
            "user.updated" => IdentityEvent::UserUpdated(serde_json::from_value(raw.data)?),
            "user.deleted" => {
                let deleted: DeletedUser = serde_json::from_value(raw.data)?;
                IdentityEvent::UserDeleted { id: deleted.id }
            }
            _ => IdentityEvent::Unhandled(raw.event_type),
        };
        Ok(event)
    }

    pub fn event_type(&self) -> &str {
        match self {
            IdentityEvent::UserCreated(_) => "user.created",
            IdentityEvent::UserUpdated(_) => "user.updated",
            IdentityEvent::UserDeleted { .. } => "user.deleted",
            IdentityEvent::Unhandled(t) => t,
        }
    }
}
