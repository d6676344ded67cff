//! # Keystone Common
//!
//! Shared types, error taxonomy, and constants used across Keystone components.
//!
//! ## Modules
//! - `types` - Core data structures (Channel, VerificationKey, ServiceOffering, etc.)
//! - `error` - Verification and service error types
//! - `constants` - Shared configuration defaults

pub mod constants;
pub mod error;
pub mod types;

pub use error::{CooldownError, KeystoneError, VerifyError};
pub use types::*;
