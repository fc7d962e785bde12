//! Shared test helpers: a scripted provider on a wiremock server and configs pointing at it.

use crate::config::Config;
use crate::flow::FlowController;
use crate::registry::{InMemoryRegistry, TaskRegistry};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) const TOKEN_PATH: &str = "/login/oauth/access_token";
pub(crate) const GENERATE_PATH: &str = "/v1beta/models/image-model:generateContent";

/// Build a valid config whose provider and generation endpoints live on `server_uri`
pub(crate) fn test_config(server_uri: &str) -> Config {
    let mut config = Config::default();
    config.provider.client_id = "client-123".into();
    config.provider.client_secret = "secret-456".into();
    config.provider.redirect_uri = "http://localhost:3000/oauth/callback".into();
    config.provider.token_url = format!("{server_uri}{TOKEN_PATH}");
    config.provider.api_base_url = server_uri.to_string();
    config.generation.api_key = Some("gen-key".into());
    config.generation.endpoint = format!("{server_uri}{GENERATE_PATH}");
    config.flow.step_timeout = Duration::from_secs(5);
    config
}

/// Controller plus the registry it uses, so tests can seed and inspect tasks
pub(crate) fn create_test_controller(config: Config) -> (Arc<FlowController>, Arc<InMemoryRegistry>) {
    let registry = Arc::new(InMemoryRegistry::new(config.flow.task_ttl));
    let controller =
        FlowController::new(Arc::new(config), registry.clone() as Arc<dyn TaskRegistry>).unwrap();
    (Arc::new(controller), registry)
}

/// Mount the happy-path exchange → identity → storage script for `repo`
pub(crate) async fn mount_happy_provider(server: &MockServer, repo: &str) {
    mount_exchange(server, ResponseTemplate::new(200).set_body_json(json!({
        "access_token": "T",
        "token_type": "bearer",
        "scope": "repo"
    })))
    .await;
    mount_identity(server, ResponseTemplate::new(200).set_body_json(json!({ "login": "alice" })))
        .await;
    mount_storage(
        server,
        repo,
        ResponseTemplate::new(201).set_body_json(json!({
            "content": {
                "name": "image.png",
                "path": "image.png",
                "html_url": format!("https://github.com/alice/{repo}/blob/main/image.png")
            },
            "commit": { "sha": "abc123" }
        })),
    )
    .await;
}

pub(crate) async fn mount_exchange(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

pub(crate) async fn mount_identity(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer T"))
        .respond_with(response)
        .mount(server)
        .await;
}

pub(crate) async fn mount_storage(server: &MockServer, repo: &str, response: ResponseTemplate) {
    Mock::given(method("PUT"))
        .and(path(format!("/repos/alice/{repo}/contents/image.png")))
        .and(header("authorization", "Bearer T"))
        .respond_with(response)
        .mount(server)
        .await;
}

pub(crate) async fn mount_generation(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Paths of every request the mock server received, in arrival order
pub(crate) async fn received_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|request| request.url.path().to_string())
        .collect()
}
