//! Configuration management for Keystone.

use anyhow::{Context, Result, ensure};
use chrono::TimeDelta;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::otp::OtpPolicy;
use keystone_common::constants::{
    DEFAULT_CODE_EXPIRY_SECS, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RESEND_COOLDOWN_SECS, DEFAULT_SWEEP_GRACE_SECS,
    DEFAULT_SWEEP_INTERVAL_SECS,
};

/// Upper bound for any configured duration (one day)
const MAX_DURATION_SECS: u64 = 86_400;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Verification code configuration
    #[serde(default)]
    pub otp: OtpConfig,

    /// Contact form configuration
    #[serde(default)]
    pub contact: ContactConfig,
}

/// Verification code timings and limits
#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    /// Code validity in seconds
    #[serde(default = "default_expiry")]
    pub expiry_secs: u64,

    /// Minimum gap between codes for the same key
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Match attempts per code
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Sweeper period
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Time an expired record survives before the sweeper drops it
    #[serde(default = "default_sweep_grace")]
    pub sweep_grace_secs: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            expiry_secs: default_expiry(),
            cooldown_secs: default_cooldown(),
            max_attempts: default_max_attempts(),
            sweep_interval_secs: default_sweep_interval(),
            sweep_grace_secs: default_sweep_grace(),
        }
    }
}

impl OtpConfig {
    pub fn policy(&self) -> OtpPolicy {
        OtpPolicy {
            expiry: TimeDelta::seconds(self.expiry_secs as i64),
            cooldown: TimeDelta::seconds(self.cooldown_secs as i64),
            max_attempts: self.max_attempts,
            sweep_grace: TimeDelta::seconds(self.sweep_grace_secs as i64),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.expiry_secs > 0, "otp.expiry_secs must be positive");
        ensure!(self.max_attempts > 0, "otp.max_attempts must be positive");
        ensure!(self.sweep_interval_secs > 0, "otp.sweep_interval_secs must be positive");
        for (name, value) in [
            ("otp.expiry_secs", self.expiry_secs),
            ("otp.cooldown_secs", self.cooldown_secs),
            ("otp.sweep_interval_secs", self.sweep_interval_secs),
            ("otp.sweep_grace_secs", self.sweep_grace_secs),
        ] {
            ensure!(value <= MAX_DURATION_SECS, "{name} must be at most {MAX_DURATION_SECS}");
        }
        Ok(())
    }
}

/// Contact form configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ContactConfig {
    /// Inbox that receives enquiries
    #[serde(default = "default_recipient")]
    pub recipient: String,

    /// Origins allowed by CORS (empty = any)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            recipient: default_recipient(),
            allowed_origins: Vec::new(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_request_timeout() -> u64 { DEFAULT_REQUEST_TIMEOUT_SECS }
fn default_expiry() -> u64 { DEFAULT_CODE_EXPIRY_SECS } // 5 minutes
fn default_cooldown() -> u64 { DEFAULT_RESEND_COOLDOWN_SECS }
fn default_max_attempts() -> u32 { DEFAULT_MAX_ATTEMPTS }
fn default_sweep_interval() -> u64 { DEFAULT_SWEEP_INTERVAL_SECS } // 10 minutes
fn default_sweep_grace() -> u64 { DEFAULT_SWEEP_GRACE_SECS }
fn default_recipient() -> String { "sales@localhost".to_string() }

impl AppConfig {
    /// Load configuration from file and `KEYSTONE__*` environment, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut builder = config::Config::builder();

        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("KEYSTONE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("contact.allowed_origins")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Failed to parse config")?;

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.request_timeout_secs > 0, "request_timeout_secs must be positive");
        self.otp.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_request_timeout(),
            otp: OtpConfig::default(),
            contact: ContactConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Args;
    use clap::Parser;

    #[test]
    fn test_defaults_match_policy_defaults() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.otp.policy(), OtpPolicy::default());
        assert_eq!(config.otp.sweep_interval(), Duration::from_secs(600));
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut config = AppConfig::default();
        config.otp.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.otp.expiry_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.otp.cooldown_secs = MAX_DURATION_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_file_with_cli_override() {
        let path = std::env::temp_dir().join(format!("keystone-test-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
listen_addr = "0.0.0.0:9000"

[otp]
expiry_secs = 120
max_attempts = 3

[contact]
recipient = "leads@plant.io"
allowed_origins = ["https://plant.io"]
"#,
        )
        .unwrap();

        let path_str = path.to_str().unwrap().to_string();
        let args = Args::parse_from(["keystone", "--config", &path_str, "--listen", "127.0.0.1:7000"]);
        let config = AppConfig::load(&path_str, &args).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.listen_addr, "127.0.0.1:7000");
        assert_eq!(config.otp.expiry_secs, 120);
        assert_eq!(config.otp.max_attempts, 3);
        assert_eq!(config.otp.cooldown_secs, DEFAULT_RESEND_COOLDOWN_SECS);
        assert_eq!(config.contact.recipient, "leads@plant.io");
        assert_eq!(config.contact.allowed_origins, vec!["https://plant.io".to_string()]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let args = Args::parse_from(["keystone"]);
        let config = AppConfig::load("does/not/exist.toml", &args).unwrap();
        assert_eq!(config.otp.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }
}
