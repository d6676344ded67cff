//! HTTP route handlers for Keystone.

use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use keystone_common::{KeystoneError, VerifyError};
use serde_json::json;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::state::AppState;

mod contact;
mod health;
mod otp;
mod services;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.contact.allowed_origins);
    let timeout = timeout_layer(state.config.request_timeout());

    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/metrics", get(health::metrics))

        // Site API
        .nest("/api", api_routes())

        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(timeout)

        // Add shared state
        .with_state(state)
}

/// Public API used by the marketing site
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(services::list_services))
        .route("/services/{slug}", get(services::get_service))
        .route("/otp/email/send", post(otp::send_email_code))
        .route("/otp/email/verify", post(otp::verify_email_code))
        .route("/otp/phone/send", post(otp::send_phone_code))
        .route("/otp/phone/verify", post(otp::verify_phone_code))
        .route("/contact", post(contact::submit_contact))
}

/// Abort handlers that outlive `timeout` with 408 Request Timeout
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}

/// Handler error: a `KeystoneError` rendered as a JSON body
#[derive(Debug)]
pub struct ApiError(pub KeystoneError);

impl<E> From<E> for ApiError
where
    E: Into<KeystoneError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }

        let mut body = json!({
            "success": false,
            "error": err.kind(),
            "message": err.public_message(),
        });

        let mut retry_after = None;
        match &err {
            KeystoneError::Cooldown(cooldown) => {
                body["retry_after_secs"] = json!(cooldown.remaining_secs);
                retry_after = Some(cooldown.remaining_secs);
            }
            KeystoneError::Verification(VerifyError::Mismatch { remaining_attempts }) => {
                body["remaining_attempts"] = json!(remaining_attempts);
            }
            _ => {}
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
