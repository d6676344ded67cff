//! Log-only transports.

use async_trait::async_trait;
use keystone_common::{ContactSubmission, VerificationKey};
use std::time::Duration;

use super::{
    DeliveryError, Mailer, SmsSender, render_code_email, render_code_sms, render_contact_email,
};

/// Writes outgoing email to the log instead of an SMTP relay
pub struct LogMailer {
    /// Inbox that receives contact enquiries
    recipient: String,
}

impl LogMailer {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(
        &self,
        to: &str,
        code: &str,
        valid_for: Duration,
    ) -> Result<(), DeliveryError> {
        if !to.contains('@') {
            return Err(DeliveryError::Rejected("recipient is not an email address".into()));
        }

        let to = VerificationKey::email(to);
        tracing::info!(to = %to, "📧 Verification email queued");
        tracing::debug!(to = %to, body = %render_code_email(code, valid_for), "📧 Email body");
        Ok(())
    }

    async fn send_contact(&self, submission: &ContactSubmission) -> Result<(), DeliveryError> {
        tracing::info!(
            recipient = %self.recipient,
            from = %VerificationKey::email(&submission.email),
            service = ?submission.service,
            "📨 Contact enquiry forwarded"
        );
        tracing::debug!(body = %render_contact_email(submission), "📨 Enquiry body");
        Ok(())
    }
}

/// Writes outgoing SMS to the log instead of an SMS gateway
#[derive(Debug, Default)]
pub struct LogSms;

#[async_trait]
impl SmsSender for LogSms {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), DeliveryError> {
        let to = VerificationKey::phone(to);
        tracing::info!(to = %to, "📱 Verification SMS queued");
        tracing::debug!(to = %to, body = %render_code_sms(code), "📱 SMS body");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_log_transports_accept_messages() {
        let mailer = LogMailer::new("sales@example.com");
        assert_ok!(
            mailer
                .send_verification_code("u@d.com", "123456", Duration::from_secs(300))
                .await
        );

        let sms = LogSms;
        assert_ok!(sms.send_verification_code("+911234567890", "123456").await);
    }

    #[tokio::test]
    async fn test_log_mailer_rejects_non_email_recipient() {
        let mailer = LogMailer::new("sales@example.com");
        let result = mailer
            .send_verification_code("+911234567890", "123456", Duration::from_secs(300))
            .await;
        assert!(matches!(result, Err(DeliveryError::Rejected(_))));
    }
}
