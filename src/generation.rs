//! Image generation pre-step
//!
//! Sends the user's prompt to a `generateContent`-style endpoint and pulls the
//! first inline image out of the reply. The image comes back base64-encoded,
//! which is already the transport encoding the content API expects, so it is
//! validated but never decoded into the task.

use crate::client::ApiClient;
use crate::config::GenerationConfig;
use crate::error::{Error, Result, Step};
use crate::types::Artifact;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

/// Ask the generation API for an image matching `prompt`
pub async fn generate_image(
    client: &ApiClient,
    generation: &GenerationConfig,
    prompt: &str,
) -> Result<Artifact> {
    let api_key = generation.api_key.as_deref().ok_or_else(|| {
        Error::config("api_key", "image generation requires a generation API key")
    })?;

    let body = json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
    });
    let request = client
        .http()
        .post(&generation.endpoint)
        .header("x-goog-api-key", api_key)
        .json(&body);

    let response = client
        .send(Step::Generate, request)
        .await?
        .error_for_status(Step::Generate)?;

    let parsed: GenerateResponse = response.json(Step::Generate)?;
    extract_image(&parsed)
}

/// Pull the first inline image part out of a generation response
fn extract_image(response: &GenerateResponse) -> Result<Artifact> {
    let inline = response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .find_map(|part| part.inline_data.as_ref())
        .ok_or_else(|| Error::unexpected(Step::Generate, "response contains no image part"))?;

    base64::engine::general_purpose::STANDARD
        .decode(&inline.data)
        .map_err(|e| Error::unexpected(Step::Generate, format!("image data is not base64: {e}")))?;

    Ok(match &inline.mime_type {
        Some(mime_type) => Artifact::new(inline.data.clone(), mime_type.clone()),
        None => Artifact::png(inline.data.clone()),
    })
}
