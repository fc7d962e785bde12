//! Flow handlers: landing form, flow start and provider callback.

use super::{ImageQuery, UploadQuery, query_params, required};
use crate::api::{AppState, html};
use crate::error::Result;
use crate::oauth::AuthorizationCallback;
use crate::types::Artifact;
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use url::Url;

/// 302 to the provider; axum's `Redirect` only offers 303/307/308.
fn found(url: &Url) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url.as_str().to_string())]).into_response()
}

/// GET / - Landing page
#[utoipa::path(
    get,
    path = "/",
    tag = "flow",
    responses(
        (status = 200, description = "HTML form for starting a flow", content_type = "text/html")
    )
)]
pub async fn index() -> Html<String> {
    Html(html::index_page())
}

/// GET /image - Generate an image from a prompt, then redirect to the provider
#[utoipa::path(
    get,
    path = "/image",
    tag = "flow",
    params(ImageQuery),
    responses(
        (status = 302, description = "Redirect to the provider authorization page"),
        (status = 404, description = "prompt or repo missing, or query string malformed", content_type = "text/html"),
        (status = 500, description = "Image generation failed", content_type = "text/html")
    )
)]
pub async fn start_image_flow(
    State(state): State<AppState>,
    query: std::result::Result<Query<ImageQuery>, QueryRejection>,
) -> Result<Response> {
    let query = query_params(query)?;
    let prompt = required(query.prompt, "prompt")?;
    let repo = required(query.repo, "repo")?;

    let url = state.flow.start_with_prompt(&prompt, repo).await?;
    Ok(found(&url))
}

/// GET /upload - Commit the configured default image, starting at the provider redirect
#[utoipa::path(
    get,
    path = "/upload",
    tag = "flow",
    params(UploadQuery),
    responses(
        (status = 302, description = "Redirect to the provider authorization page"),
        (status = 404, description = "repo missing, or query string malformed", content_type = "text/html")
    )
)]
pub async fn start_upload_flow(
    State(state): State<AppState>,
    query: std::result::Result<Query<UploadQuery>, QueryRejection>,
) -> Result<Response> {
    let query = query_params(query)?;
    let repo = required(query.repo, "repo")?;
    let artifact = Artifact::png(state.config.upload.default_artifact.clone());

    let url = state.flow.start(artifact, repo).await?;
    Ok(found(&url))
}

/// GET /oauth/callback - Provider redirect target; finishes the flow
#[utoipa::path(
    get,
    path = "/oauth/callback",
    tag = "flow",
    params(AuthorizationCallback),
    responses(
        (status = 200, description = "Artifact committed; page shows a preview", content_type = "text/html"),
        (status = 404, description = "Missing or repeated code or state, unknown state, access denied, or repository not found", content_type = "text/html"),
        (status = 500, description = "Exchange, identity or storage call failed", content_type = "text/html")
    )
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    callback: std::result::Result<Query<AuthorizationCallback>, QueryRejection>,
) -> Result<Html<String>> {
    let completion = state.flow.complete(query_params(callback)?).await?;
    Ok(Html(html::success_page(&completion)))
}
