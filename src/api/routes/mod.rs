//! Route handlers for the HTTP surface
//!
//! Handlers are organized by domain:
//! - [`flow`] - Form, flow start endpoints and the provider callback
//! - [`system`] - Health and OpenAPI

use crate::error::{Error, Result};
use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use serde::{Deserialize, Serialize};

mod flow;
mod system;

// Re-export all handlers so the router can address them as `routes::function_name`
pub use flow::*;
pub use system::*;

// ============================================================================
// Query/Response Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /image
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageQuery {
    /// Text prompt the image is generated from
    pub prompt: Option<String>,
    /// Name of the repository (owned by the authenticated user) to commit into
    pub repo: Option<String>,
}

/// Query parameters for GET /upload
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Name of the repository (owned by the authenticated user) to commit into
    pub repo: Option<String>,
}

/// Response body for GET /health
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is accepting requests
    pub status: String,
    /// Crate version
    pub version: String,
    /// Flows waiting for their provider callback
    pub pending_tasks: usize,
}

/// Unwrap query extraction, reporting undecodable query strings as [`Error::InvalidQuery`]
fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => Err(Error::InvalidQuery(rejection.body_text())),
    }
}

/// Extract a required, non-blank query parameter
fn required(value: Option<String>, name: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Error::MissingParameter(name)),
    }
}
