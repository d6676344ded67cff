//! Application state and shared resources.

use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::delivery::{LogMailer, LogSms, Mailer, SmsSender};
use crate::otp::OtpManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Verification code store
    pub otp: Arc<OtpManager>,

    /// Email collaborator
    pub mailer: Arc<dyn Mailer>,

    /// SMS collaborator
    pub sms: Arc<dyn SmsSender>,

    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// State wired to the log-only delivery transports
    pub fn new(config: AppConfig, otp: Arc<OtpManager>) -> Self {
        let mailer = Arc::new(LogMailer::new(config.contact.recipient.clone()));
        Self::with_delivery(config, otp, mailer, Arc::new(LogSms))
    }

    pub fn with_delivery(
        config: AppConfig,
        otp: Arc<OtpManager>,
        mailer: Arc<dyn Mailer>,
        sms: Arc<dyn SmsSender>,
    ) -> Self {
        Self {
            config,
            otp,
            mailer,
            sms,
            started_at: Instant::now(),
        }
    }

    /// How long a code stays valid, as a std duration for delivery templates
    pub fn code_validity(&self) -> std::time::Duration {
        self.otp.policy().expiry.to_std().unwrap_or_default()
    }
}
