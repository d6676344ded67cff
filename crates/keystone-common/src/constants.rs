//! Shared constants for Keystone components.

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Verification code validity (5 minutes)
pub const DEFAULT_CODE_EXPIRY_SECS: u64 = 300;

/// Minimum gap between two codes for the same key
pub const DEFAULT_RESEND_COOLDOWN_SECS: u64 = 60;

/// Maximum verification attempts per issued code
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How often the expiry sweeper runs (10 minutes)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;

/// How long an expired record lingers before the sweeper reclaims it
pub const DEFAULT_SWEEP_GRACE_SECS: u64 = 60;

/// Per-request timeout applied by the HTTP layer
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Number of digits in a verification code
pub const CODE_LENGTH: usize = 6;

/// Smallest code value (codes never start with zero)
pub const CODE_MIN: u32 = 100_000;

/// Largest code value
pub const CODE_MAX: u32 = 999_999;

/// Input limits for caller-side validation
pub mod limits {
    /// RFC 5321 path limit
    pub const EMAIL_MAX_LEN: usize = 254;

    /// E.164 allows at most 15 digits including the country code
    pub const E164_MAX_DIGITS: usize = 15;

    pub const NATIONAL_MIN_DIGITS: usize = 6;
    pub const NATIONAL_MAX_DIGITS: usize = 14;

    pub const NAME_MAX_LEN: usize = 100;
    pub const COMPANY_MAX_LEN: usize = 150;
    pub const MESSAGE_MAX_LEN: usize = 5000;
}
