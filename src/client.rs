//! Outbound HTTP client shared by every step of a flow
//!
//! Each call is sent once, its body is buffered in full (payloads are small
//! JSON documents) and the caller gets back exactly one of a buffered
//! [`ApiResponse`] or an [`Error`]. There are no retries.

use crate::config::ProviderConfig;
use crate::error::{Error, Result, Step};
use crate::types::Credential;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A fully buffered upstream response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Raw body text
    pub body: String,
}

impl ApiResponse {
    /// Parse the body as JSON, mapping shape errors onto `step`
    pub fn json<T: DeserializeOwned>(&self, step: Step) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| Error::unexpected(step, e.to_string()))
    }

    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-2xx response into [`Error::UpstreamStatus`]
    pub fn error_for_status(self, step: Step) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::UpstreamStatus {
                step,
                status: self.status.as_u16(),
                body: self.body,
            })
        }
    }
}

/// Thin wrapper around a pooled [`reqwest::Client`]
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client that gives up on any single call after `timeout`
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {e}"),
                key: None,
            })?;

        Ok(Self { http, timeout })
    }

    /// Access the underlying client to build a request
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Start a bearer-authenticated request against the provider REST API
    ///
    /// `path` is appended to `api_base_url`. Adds the JSON accept type and the
    /// API version header the provider requires on every call.
    pub fn provider_request(
        &self,
        method: Method,
        provider: &ProviderConfig,
        path: &str,
        credential: &Credential,
    ) -> RequestBuilder {
        let url = format!("{}{}", provider.api_base_url.trim_end_matches('/'), path);
        self.http
            .request(method, url)
            .bearer_auth(credential.secret())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", &provider.api_version)
    }

    /// Send `request`, buffer the body, and return it regardless of status
    pub async fn send(&self, step: Step, request: RequestBuilder) -> Result<ApiResponse> {
        let response = request.send().await.map_err(|e| self.map_transport(step, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport(step, e))?;

        tracing::debug!(step = %step, status = status.as_u16(), bytes = body.len(), "upstream responded");

        Ok(ApiResponse { status, body })
    }

    fn map_transport(&self, step: Step, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            tracing::warn!(step = %step, timeout = ?self.timeout, "upstream call timed out");
            Error::FlowTimeout { step }
        } else {
            tracing::warn!(step = %step, error = %e, "upstream call failed");
            Error::Transport { step, source: e }
        }
    }
}
