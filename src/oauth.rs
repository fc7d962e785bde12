//! Authorization-code grant against the provider
//!
//! Two halves of the handshake live here:
//! - [`authorization_url`] builds the redirect that sends the user agent to the
//!   provider, carrying the task token as `state`
//! - [`exchange_code`] trades the code the provider hands back for a bearer
//!   [`Credential`]
//!
//! Correlating the callback with its task is the flow controller's job.

use crate::client::ApiClient;
use crate::config::ProviderConfig;
use crate::error::{Error, Result, Step};
use crate::types::{Credential, TaskToken};
use serde::Deserialize;
use url::Url;

/// Query string the provider appends when redirecting back to `/oauth/callback`
#[derive(Debug, Default, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizationCallback {
    /// Authorization code (absent when the user denied access)
    pub code: Option<String>,
    /// Echo of the `state` sent in the redirect
    pub state: Option<String>,
    /// Provider error code, e.g. `access_denied`
    pub error: Option<String>,
    /// Human-readable provider error
    pub error_description: Option<String>,
}

/// Build the provider authorization URL for `token`
///
/// `state` is set to the token so the callback can be matched to its task and
/// forged callbacks can be rejected.
pub fn authorization_url(provider: &ProviderConfig, token: &TaskToken) -> Result<Url> {
    Url::parse_with_params(
        &provider.authorize_url,
        [
            ("client_id", provider.client_id.as_str()),
            ("redirect_uri", provider.redirect_uri.as_str()),
            ("scope", provider.scope.as_str()),
            ("state", token.as_str()),
        ],
    )
    .map_err(|e| Error::config("authorize_url", e.to_string()))
}

/// Token endpoint response; the provider reports grant errors with HTTP 200
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchange an authorization code for an access token
///
/// Single form-encoded POST to the token endpoint, asking for a JSON reply.
pub async fn exchange_code(
    client: &ApiClient,
    provider: &ProviderConfig,
    code: &str,
) -> Result<Credential> {
    let request = client
        .http()
        .post(&provider.token_url)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", provider.redirect_uri.as_str()),
        ]);

    let response = client
        .send(Step::Exchange, request)
        .await?
        .error_for_status(Step::Exchange)?;
    let token: TokenResponse = response.json(Step::Exchange)?;

    match token {
        TokenResponse {
            access_token: Some(access_token),
            ..
        } if !access_token.is_empty() => Ok(Credential::new(access_token)),
        TokenResponse {
            error: Some(error),
            error_description,
            ..
        } => Err(Error::unexpected(
            Step::Exchange,
            match error_description {
                Some(description) => format!("{error}: {description}"),
                None => error,
            },
        )),
        _ => Err(Error::unexpected(
            Step::Exchange,
            "response has no access_token",
        )),
    }
}
