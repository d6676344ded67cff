//! Out-of-band delivery of verification codes and contact enquiries.
//!
//! The OTP manager never sends anything itself; handlers hand the issued
//! code to one of these collaborators. Transports are swappable behind the
//! traits. The shipped ones write to the log, which is what development and
//! staging deployments run with.

mod log_only;

pub use log_only::{LogMailer, LogSms};

use async_trait::async_trait;
use keystone_common::{ContactSubmission, KeystoneError};
use std::time::Duration;
use thiserror::Error;

/// Delivery failures, reported to the client but never rolled back into the
/// OTP store
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transport refused the message (bad address, policy)
    #[error("message rejected: {0}")]
    Rejected(String),

    /// Transport could not be reached
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

impl From<DeliveryError> for KeystoneError {
    fn from(err: DeliveryError) -> Self {
        KeystoneError::Delivery(err.to_string())
    }
}

/// Email collaborator
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a verification code to `to`
    async fn send_verification_code(
        &self,
        to: &str,
        code: &str,
        valid_for: Duration,
    ) -> Result<(), DeliveryError>;

    /// Forward a contact enquiry to the sales inbox
    async fn send_contact(&self, submission: &ContactSubmission) -> Result<(), DeliveryError>;
}

/// SMS collaborator
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Send a verification code to an E.164 number
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), DeliveryError>;
}

/// Plain-text body of the verification email
pub fn render_code_email(code: &str, valid_for: Duration) -> String {
    let minutes = valid_for.as_secs().div_ceil(60);
    format!(
        "Your verification code is {code}.\n\n\
         It expires in {minutes} {}. If you did not request it, ignore this email.",
        if minutes == 1 { "minute" } else { "minutes" }
    )
}

/// Plain-text body of the verification SMS
pub fn render_code_sms(code: &str) -> String {
    format!("{code} is your verification code. Do not share it with anyone.")
}

/// Plain-text body of the email forwarded to the sales inbox
pub fn render_contact_email(submission: &ContactSubmission) -> String {
    let mut body = format!("Name: {}\nEmail: {}\n", submission.name, submission.email);
    if let Some(phone) = &submission.phone {
        body.push_str(&format!("Phone: {phone}\n"));
    }
    if let Some(company) = &submission.company {
        body.push_str(&format!("Company: {company}\n"));
    }
    if let Some(service) = &submission.service {
        body.push_str(&format!("Service: {service}\n"));
    }
    body.push('\n');
    body.push_str(&submission.message);
    body
}

/// In-memory transports for handler tests
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    /// Records every message; can be switched into failure mode or slowed down
    #[derive(Default)]
    pub struct Outbox {
        pub codes: Mutex<Vec<(String, String)>>,
        pub contacts: Mutex<Vec<ContactSubmission>>,
        failing: AtomicBool,
        latency_ms: AtomicU64,
    }

    impl Outbox {
        pub fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Delay every contact forward by `latency`
        pub fn slow(&self, latency: Duration) {
            self.latency_ms
                .store(latency.as_millis() as u64, Ordering::SeqCst);
        }

        pub fn last_code_for(&self, to: &str) -> Option<String> {
            self.codes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(addr, _)| addr == to)
                .map(|(_, code)| code.clone())
        }

        fn check(&self) -> Result<(), DeliveryError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(DeliveryError::Unavailable("outbox offline".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Mailer for Outbox {
        async fn send_verification_code(
            &self,
            to: &str,
            code: &str,
            _valid_for: Duration,
        ) -> Result<(), DeliveryError> {
            self.check()?;
            self.codes.lock().unwrap().push((to.to_string(), code.to_string()));
            Ok(())
        }

        async fn send_contact(&self, submission: &ContactSubmission) -> Result<(), DeliveryError> {
            let latency = self.latency_ms.load(Ordering::SeqCst);
            if latency > 0 {
                tokio::time::sleep(Duration::from_millis(latency)).await;
            }
            self.check()?;
            self.contacts.lock().unwrap().push(submission.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl SmsSender for Outbox {
        async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), DeliveryError> {
            self.check()?;
            self.codes.lock().unwrap().push((to.to_string(), code.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_code_email_rounds_minutes() {
        let body = render_code_email("123456", Duration::from_secs(300));
        assert!(body.contains("123456"));
        assert!(body.contains("5 minutes"));

        let body = render_code_email("123456", Duration::from_secs(45));
        assert!(body.contains("1 minute."));
    }

    #[test]
    fn test_render_contact_email_skips_empty_fields() {
        let submission = ContactSubmission {
            name: "Ada".into(),
            email: "ada@plant.io".into(),
            phone: None,
            company: Some("Plant IO".into()),
            service: None,
            message: "Need a SCADA retrofit".into(),
        };
        let body = render_contact_email(&submission);
        assert!(body.contains("Company: Plant IO"));
        assert!(!body.contains("Phone:"));
        assert!(body.ends_with("Need a SCADA retrofit"));
    }

    #[test]
    fn test_delivery_error_maps_to_bad_gateway() {
        let err: KeystoneError = DeliveryError::Unavailable("smtp".into()).into();
        assert_eq!(err.status_code(), 502);
    }
}
