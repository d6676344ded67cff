//! Service catalog endpoints.

use axum::{Json, extract::Path};
use keystone_common::{KeystoneError, ServiceOffering};

use super::ApiError;
use crate::catalog;

/// List every service offering
pub async fn list_services() -> Json<&'static [ServiceOffering]> {
    Json(catalog::all())
}

/// Fetch one service by slug
pub async fn get_service(
    Path(slug): Path<String>,
) -> Result<Json<&'static ServiceOffering>, ApiError> {
    catalog::find(&slug)
        .map(Json)
        .ok_or_else(|| KeystoneError::NotFound(format!("No service named '{slug}'.")).into())
}
