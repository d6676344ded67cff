//! Error types for Keystone components.
//!
//! `CooldownError` and `VerifyError` are returned by the OTP manager and
//! carry the user-facing text. `KeystoneError` is the service-level taxonomy
//! that HTTP handlers map onto status codes.

use thiserror::Error;

/// A new code was requested before the resend cooldown elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "Please wait {remaining_secs} {} before requesting a new code.",
    plural(.remaining_secs, "second", "seconds")
)]
pub struct CooldownError {
    /// Seconds until a new code may be issued, rounded up
    pub remaining_secs: u64,
}

/// Why a submitted verification code was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// No code was issued for this key (or it was already cleared/swept)
    #[error("No verification code found. Please request a new one.")]
    NotFound,

    /// The code outlived its validity window; the record is gone
    #[error("Verification code has expired. Please request a new one.")]
    Expired,

    /// Too many wrong guesses; the record is gone
    #[error("Too many failed attempts. Please request a new code.")]
    AttemptsExhausted,

    /// Wrong code, but attempts remain
    #[error(
        "Invalid verification code. {remaining_attempts} {} remaining.",
        plural(.remaining_attempts, "attempt", "attempts")
    )]
    Mismatch { remaining_attempts: u32 },
}

impl VerifyError {
    /// Stable machine-readable identifier
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "code_not_found",
            Self::Expired => "code_expired",
            Self::AttemptsExhausted => "attempts_exhausted",
            Self::Mismatch { .. } => "code_mismatch",
        }
    }
}

fn plural<N>(count: &N, one: &'static str, many: &'static str) -> &'static str
where
    N: PartialEq + From<u8>,
{
    if *count == N::from(1) { one } else { many }
}

/// Service-level errors across Keystone components
#[derive(Debug, Error)]
pub enum KeystoneError {
    /// Invalid input/request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resend requested too early
    #[error(transparent)]
    Cooldown(#[from] CooldownError),

    /// Verification code rejected
    #[error(transparent)]
    Verification(#[from] VerifyError),

    /// Action requires a verified identifier
    #[error("Verification required: {0}")]
    Unverified(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Email/SMS collaborator failed
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl KeystoneError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Cooldown(_) => 429,
            Self::Verification(err) => match err {
                VerifyError::NotFound => 404,
                VerifyError::Expired => 410,
                VerifyError::AttemptsExhausted => 429,
                VerifyError::Mismatch { .. } => 422,
            },
            Self::Unverified(_) => 403,
            Self::NotFound(_) => 404,
            Self::Delivery(_) => 502,
        }
    }

    /// Stable machine-readable identifier for response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Cooldown(_) => "cooldown",
            Self::Verification(err) => err.kind(),
            Self::Unverified(_) => "unverified",
            Self::NotFound(_) => "not_found",
            Self::Delivery(_) => "delivery_failed",
        }
    }

    /// Text safe to show to an end user; internal details stay in the logs
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) | Self::Unverified(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Cooldown(err) => err.to_string(),
            Self::Verification(err) => err.to_string(),
            Self::Delivery(_) => "We could not deliver your message. Please try again.".to_string(),
        }
    }
}
