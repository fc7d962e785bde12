//! Scripted provider and image API on a wiremock server

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/login/oauth/access_token";
pub const GENERATE_PATH: &str = "/v1beta/models/test-image:generateContent";

/// Base64 the scripted image API returns
pub const GENERATED_IMAGE: &str = "aW1hZ2UtYnl0ZXM=";

/// Start a server that answers every step of a successful flow for `repo`
///
/// Each step is expected exactly `flows` times.
pub async fn start_provider(repo: &str, flows: u64) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "gen-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your image" },
                        { "inlineData": { "mimeType": "image/png", "data": GENERATED_IMAGE } }
                    ]
                }
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gho_integration",
            "token_type": "bearer",
            "scope": "repo"
        })))
        .expect(flows)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer gho_integration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "octo" })))
        .expect(flows)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/repos/octo/{repo}/contents/image.png")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": {
                "path": "image.png",
                "html_url": format!("https://github.com/octo/{repo}/blob/main/image.png")
            },
            "commit": { "sha": "f00dfeed" }
        })))
        .expect(flows)
        .mount(&server)
        .await;

    server
}
