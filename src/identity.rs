//! Identity lookup for the account that granted access

use crate::client::ApiClient;
use crate::config::ProviderConfig;
use crate::error::{Error, Result, Step};
use crate::types::{Credential, Identity};
use reqwest::Method;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: Option<String>,
}

/// Fetch the login of the user behind `credential`
///
/// One `GET /user`. A non-2xx status, malformed JSON, or a missing or empty
/// `login` all fail the flow.
pub async fn resolve_identity(
    client: &ApiClient,
    provider: &ProviderConfig,
    credential: &Credential,
) -> Result<Identity> {
    let request = client.provider_request(Method::GET, provider, "/user", credential);
    let response = client
        .send(Step::Identity, request)
        .await?
        .error_for_status(Step::Identity)?;

    let user: UserResponse = response.json(Step::Identity)?;
    match user.login {
        Some(login) if !login.is_empty() => Ok(Identity { login }),
        _ => Err(Error::unexpected(Step::Identity, "response has no login")),
    }
}
