//! Verification code endpoints for the email and phone flows.
//!
//! Handlers validate syntax, call the OTP manager, and hand issued codes to
//! the matching delivery collaborator. A delivery failure is reported to the
//! client but the issued code (and its cooldown) stays in place.

use axum::{Json, extract::State};
use keystone_common::{Channel, VerifyOutcome};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::state::AppState;
use crate::validation;

#[derive(Serialize)]
pub struct SendResponse {
    success: bool,
    message: &'static str,
    expires_in_secs: i64,
    resend_in_secs: i64,
}

impl SendResponse {
    fn new(state: &AppState, message: &'static str) -> Self {
        let policy = state.otp.policy();
        Self {
            success: true,
            message,
            expires_in_secs: policy.expiry.num_seconds(),
            resend_in_secs: policy.cooldown.num_seconds(),
        }
    }
}

#[derive(Serialize)]
pub struct VerifyResponse {
    success: bool,
    verified: bool,
    outcome: VerifyOutcome,
    message: &'static str,
}

impl From<VerifyOutcome> for VerifyResponse {
    fn from(outcome: VerifyOutcome) -> Self {
        Self {
            success: true,
            verified: true,
            outcome,
            message: outcome.message(),
        }
    }
}

#[derive(Deserialize)]
pub struct EmailSendRequest {
    email: String,
}

/// Issue a code and email it
pub async fn send_email_code(
    State(state): State<AppState>,
    Json(payload): Json<EmailSendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let email = validation::email(&payload.email)?;
    let issued = state.otp.issue(Channel::Email, &email)?;

    if let Err(e) = state
        .mailer
        .send_verification_code(&email, &issued.code, state.code_validity())
        .await
    {
        tracing::error!(error = %e, "Failed to deliver verification email");
        return Err(e.into());
    }

    Ok(Json(SendResponse::new(
        &state,
        "Verification code sent to your email.",
    )))
}

#[derive(Deserialize)]
pub struct EmailVerifyRequest {
    email: String,
    code: String,
}

/// Check an emailed code
pub async fn verify_email_code(
    State(state): State<AppState>,
    Json(payload): Json<EmailVerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let email = validation::email(&payload.email)?;
    let code = validation::code(&payload.code)?;

    let outcome = state.otp.verify(Channel::Email, &email, code)?;
    Ok(Json(outcome.into()))
}

#[derive(Deserialize)]
pub struct PhoneSendRequest {
    /// Country dial code, e.g. `+91`
    dial_code: String,
    /// National number without the dial code
    phone: String,
}

/// Issue a code and text it
pub async fn send_phone_code(
    State(state): State<AppState>,
    Json(payload): Json<PhoneSendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let phone = validation::phone(&payload.dial_code, &payload.phone)?;
    let issued = state.otp.issue(Channel::Phone, &phone)?;

    if let Err(e) = state.sms.send_verification_code(&phone, &issued.code).await {
        tracing::error!(error = %e, "Failed to deliver verification SMS");
        return Err(e.into());
    }

    Ok(Json(SendResponse::new(
        &state,
        "Verification code sent to your phone.",
    )))
}

#[derive(Deserialize)]
pub struct PhoneVerifyRequest {
    dial_code: String,
    phone: String,
    code: String,
}

/// Check a texted code
pub async fn verify_phone_code(
    State(state): State<AppState>,
    Json(payload): Json<PhoneVerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let phone = validation::phone(&payload.dial_code, &payload.phone)?;
    let code = validation::code(&payload.code)?;

    let outcome = state.otp.verify(Channel::Phone, &phone, code)?;
    Ok(Json(outcome.into()))
}
