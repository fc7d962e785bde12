//! Error types for repo-drop
//!
//! Every failure a flow can hit is represented here, grouped the way the
//! HTTP surface reports them:
//! - correlation and input errors (missing or repeated parameters, unknown or replayed state) → 404
//! - semantic provider errors (a well-formed "Not Found" from the storage API) → 404
//! - transport, upstream status, parse/shape and timeout errors → 500
//!
//! No variant is retried anywhere; each one is terminal for the request that hit it.

use std::fmt;
use thiserror::Error;

/// Result type alias for repo-drop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Outbound call a flow was performing when it failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Generation API call (image pipeline pre-step)
    Generate,
    /// Authorization code → access token exchange
    Exchange,
    /// Identity lookup (`GET /user`)
    Identity,
    /// Content write (`PUT /repos/{owner}/{repo}/contents/{path}`)
    Persist,
}

impl Step {
    /// Stable lowercase name used in logs and error codes
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Generate => "generate",
            Step::Exchange => "exchange",
            Step::Identity => "identity",
            Step::Persist => "persist",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for repo-drop
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "client_id")
        key: Option<String>,
    },

    /// A required query parameter was absent or empty
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The query string could not be decoded (e.g., a repeated parameter)
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// The callback `state` does not match any in-flight task
    ///
    /// Covers tokens that were never issued, tokens already consumed by an
    /// earlier callback, and tokens whose task expired.
    #[error("unknown or expired authorization state")]
    UnknownState,

    /// The provider redirected back with an error instead of a code
    #[error("authorization was not granted: {0}")]
    AuthorizationDenied(String),

    /// An outbound call failed at the network layer
    #[error("{step} request failed: {source}")]
    Transport {
        /// Which call failed
        step: Step,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// An outbound call returned a non-success status with no recognised error body
    #[error("{step} request returned HTTP {status}: {body}")]
    UpstreamStatus {
        /// Which call failed
        step: Step,
        /// HTTP status returned by the upstream API
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A response body did not have the expected shape
    #[error("unexpected {step} response: {reason}")]
    UnexpectedResponse {
        /// Which call produced the response
        step: Step,
        /// What was wrong with it
        reason: String,
    },

    /// The storage endpoint reported that the target resource does not exist
    #[error("{resource} not found")]
    ResourceNotFound {
        /// The resource as addressed (e.g., "alice/my-repo")
        resource: String,
    },

    /// The target path already holds a file
    ///
    /// Writes never replace existing content, so a second flow into the same
    /// repository and path is refused by the provider.
    #[error("{path} already exists")]
    ContentExists {
        /// The resource and path as addressed (e.g., "alice/my-repo/image.png")
        path: String,
    },

    /// A step or the whole flow ran past its deadline
    #[error("{step} did not complete in time")]
    FlowTimeout {
        /// The step that was in flight when the deadline passed
        step: Step,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Shorthand for building an [`Error::UnexpectedResponse`]
    pub fn unexpected(step: Step, reason: impl Into<String>) -> Self {
        Error::UnexpectedResponse {
            step,
            reason: reason.into(),
        }
    }

    /// Build a configuration error for a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Returns true for errors caused by the inbound request rather than the server
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// Convert errors to HTTP status codes for responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 404 Not Found - correlation, input and semantic provider errors
            Error::MissingParameter(_) => 404,
            Error::InvalidQuery(_) => 404,
            Error::UnknownState => 404,
            Error::AuthorizationDenied(_) => 404,
            Error::ResourceNotFound { .. } => 404,

            // 500 Internal Server Error - everything the server or upstream got wrong
            Error::Config { .. } => 500,
            Error::Transport { .. } => 500,
            Error::UpstreamStatus { .. } => 500,
            Error::UnexpectedResponse { .. } => 500,
            Error::ContentExists { .. } => 500,
            Error::FlowTimeout { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::MissingParameter(_) => "missing_parameter",
            Error::InvalidQuery(_) => "invalid_query",
            Error::UnknownState => "unknown_state",
            Error::AuthorizationDenied(_) => "authorization_denied",
            Error::Transport { .. } => "transport_error",
            Error::UpstreamStatus { .. } => "upstream_status",
            Error::UnexpectedResponse { .. } => "unexpected_response",
            Error::ResourceNotFound { .. } => "resource_not_found",
            Error::ContentExists { .. } => "content_exists",
            Error::FlowTimeout { .. } => "flow_timeout",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}
