//! Contact form submission, gated on a verified email.

use axum::{Json, extract::State};
use keystone_common::{Channel, KeystoneError, VerificationKey};
use serde::Serialize;

use super::ApiError;
use crate::state::AppState;
use crate::validation::{self, ContactForm};

#[derive(Serialize)]
pub struct ContactResponse {
    success: bool,
    message: &'static str,
}

/// Accept a contact enquiry.
///
/// Rejected outright unless the email passed OTP verification. The
/// verification is claimed for the duration of the forward and cleared once
/// it succeeds, so a second submission needs a fresh code. If forwarding
/// fails the claim is released for a retry.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<Json<ContactResponse>, ApiError> {
    if !state.otp.is_verified(Channel::Email, &form.email) {
        tracing::debug!(
            from = %VerificationKey::email(&form.email),
            "Contact submission without verified email"
        );
        return Err(KeystoneError::Unverified(
            "Please verify your email address before submitting.".into(),
        )
        .into());
    }

    let submission = validation::contact(form)?;

    // Claim before forwarding so a concurrent submission for the same
    // address cannot pass the gate as well
    if !state.otp.claim_verified(Channel::Email, &submission.email) {
        return Err(KeystoneError::Unverified(
            "Please verify your email address before submitting.".into(),
        )
        .into());
    }

    if let Err(e) = state.mailer.send_contact(&submission).await {
        tracing::error!(error = %e, "Failed to forward contact enquiry");
        state.otp.release_claim(Channel::Email, &submission.email);
        return Err(e.into());
    }

    state.otp.clear(Channel::Email, &submission.email);

    tracing::info!(
        from = %VerificationKey::email(&submission.email),
        service = ?submission.service,
        "Contact enquiry accepted"
    );

    Ok(Json(ContactResponse {
        success: true,
        message: "Thank you! We will get back to you shortly.",
    }))
}
