//! One-time verification codes for the email and phone flows.
//!
//! The manager owns an in-memory store keyed by `(channel, identifier)`.
//! Time and randomness are injected so the whole lifecycle can be driven
//! deterministically from tests.

mod clock;
mod code;
mod manager;
mod sweeper;

pub use clock::{Clock, SystemClock};
pub use code::{CodeSource, RandomCodes};
pub use manager::{OtpManager, OtpPolicy, OtpStatsSnapshot};
pub use sweeper::sweeper_worker;

#[cfg(test)]
pub use clock::ManualClock;
#[cfg(test)]
pub use code::FixedCodes;

use chrono::{DateTime, Utc};

/// Stored state for one verification key
#[derive(Debug, Clone)]
pub struct VerificationRecord {
    /// The code the user must echo back
    pub code: String,
    /// Issuance timestamp
    pub issued_at: DateTime<Utc>,
    /// Code is rejected strictly after this instant
    pub expires_at: DateTime<Utc>,
    /// No replacement code before this instant
    pub cooldown_until: DateTime<Utc>,
    /// Match attempts consumed so far
    pub attempts: u32,
    /// Set once by the first successful match
    pub verified: bool,
    /// Held by an in-flight use of the verification
    pub claimed: bool,
}

impl VerificationRecord {
    pub fn new(code: String, now: DateTime<Utc>, policy: &OtpPolicy) -> Self {
        Self {
            code,
            issued_at: now,
            expires_at: now + policy.expiry,
            cooldown_until: now + policy.cooldown,
            attempts: 0,
            verified: false,
            claimed: false,
        }
    }
}
