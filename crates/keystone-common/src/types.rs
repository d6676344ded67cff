//! Core types shared across Keystone components.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Delivery channel a verification code travels over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    /// E.164 phone number (dial code + national number)
    Phone,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a verification record: `(channel, identifier)`.
///
/// Email identifiers are trimmed and lower-cased so `" User@D.com"` and
/// `"user@d.com"` share a record. Phone identifiers are kept exactly as
/// given; callers are expected to hand over a canonical E.164 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationKey {
    channel: Channel,
    identifier: String,
}

impl VerificationKey {
    pub fn new(channel: Channel, identifier: &str) -> Self {
        let identifier = match channel {
            Channel::Email => identifier.trim().to_lowercase(),
            Channel::Phone => identifier.to_string(),
        };
        Self {
            channel,
            identifier,
        }
    }

    pub fn email(address: &str) -> Self {
        Self::new(Channel::Email, address)
    }

    pub fn phone(e164: &str) -> Self {
        Self::new(Channel::Phone, e164)
    }

    /// Short, non-reversible tag for log lines.
    ///
    /// Raw emails and phone numbers never reach the log output; this digest
    /// still lets an operator correlate events for one key.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.channel.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(self.identifier.as_bytes());
        let digest = hasher.finalize();
        format!("{}:{}", self.channel, URL_SAFE_NO_PAD.encode(&digest[..9]))
    }
}

impl fmt::Display for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

/// A freshly issued code, handed to the caller for out-of-band delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// Plaintext 6-digit code
    pub code: String,

    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,

    /// Earliest time a replacement may be issued
    pub cooldown_until: DateTime<Utc>,
}

/// Successful verification result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// The submitted code matched; the key is now verified
    Verified,
    /// The key was verified earlier; nothing was checked or counted
    AlreadyVerified,
}

impl VerifyOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Verified => "Verification successful.",
            Self::AlreadyVerified => "Already verified.",
        }
    }
}

/// A service line offered by the company, listed on the public site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOffering {
    /// URL-safe identifier
    pub slug: &'static str,

    pub title: &'static str,

    /// One-sentence teaser for cards
    pub summary: &'static str,

    /// Bullet points shown on the detail page
    pub capabilities: &'static [&'static str],
}

/// Contact form payload, after validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,

    /// Must be verified through the email OTP flow before submission
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Catalog slug of the service the enquiry is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_keys_are_normalized() {
        let a = VerificationKey::email("  User@Example.COM ");
        let b = VerificationKey::email("user@example.com");
        assert_eq!(a, b);
        assert_eq!(a.identifier, "user@example.com");
    }

    #[test]
    fn test_phone_keys_are_exact() {
        let a = VerificationKey::phone("+911234567890");
        let b = VerificationKey::phone(" +911234567890");
        assert_ne!(a, b);
        assert_eq!(a.identifier, "+911234567890");
    }

    #[test]
    fn test_channels_do_not_collide() {
        let email = VerificationKey::new(Channel::Email, "+911234567890");
        let phone = VerificationKey::new(Channel::Phone, "+911234567890");
        assert_ne!(email, phone);
        assert_ne!(email.fingerprint(), phone.fingerprint());
    }

    #[test]
    fn test_fingerprint_hides_identifier() {
        let key = VerificationKey::email("secret@example.com");
        let tag = key.fingerprint();
        assert!(tag.starts_with("email:"));
        assert!(!tag.contains("secret"));
        assert_eq!(tag, VerificationKey::email("SECRET@example.com").fingerprint());
        assert_eq!(key.to_string(), tag);
    }

    #[test]
    fn test_channel_serde() {
        assert_eq!(serde_json::to_string(&Channel::Phone).unwrap(), "\"phone\"");
        let parsed: Channel = serde_json::from_str("\"email\"").unwrap();
        assert_eq!(parsed, Channel::Email);
    }

    #[test]
    fn test_verify_outcome_messages() {
        assert_eq!(VerifyOutcome::Verified.message(), "Verification successful.");
        assert_eq!(
            serde_json::to_string(&VerifyOutcome::AlreadyVerified).unwrap(),
            "\"already_verified\""
        );
    }
}
