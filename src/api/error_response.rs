//! HTTP error response handling for the API
//!
//! Converts domain errors into HTML error pages carrying the status code from
//! [`ToHttpStatus`].

use crate::api::html;
use crate::error::{Error, ToHttpStatus};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.is_client_error() {
            tracing::info!(status = status_code.as_u16(), error = %self, "request rejected");
        } else {
            tracing::error!(status = status_code.as_u16(), error = %self, "request failed");
        }

        let body = html::error_page(status_code.as_u16(), self.error_code(), &self.to_string());
        (status_code, Html(body)).into_response()
    }
}
