//! Spawn the real server on an ephemeral port

use repo_drop::{Config, FlowController, InMemoryRegistry, TaskRegistry, api};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::provider::{GENERATE_PATH, TOKEN_PATH};

/// A running server plus the handles needed to inspect and stop it
pub struct TestApp {
    pub address: SocketAddr,
    pub registry: Arc<InMemoryRegistry>,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<repo_drop::Result<()>>,
    pub http: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.address, path_and_query)
    }

    pub async fn get(&self, path_and_query: &str) -> reqwest::Response {
        self.http
            .get(self.url(path_and_query))
            .send()
            .await
            .expect("request to test server failed")
    }

    /// Cancel the server and wait for it to finish
    pub async fn stop(self) {
        self.shutdown.cancel();
        self.handle
            .await
            .expect("server task panicked")
            .expect("server returned an error");
    }
}

/// Configuration loaded the same way the binary loads it, pointing at `provider_uri`
pub fn config_for(provider_uri: &str) -> Config {
    let vars: HashMap<&str, String> = [
        ("REPO_DROP_CLIENT_ID", "integration-client".to_string()),
        ("REPO_DROP_CLIENT_SECRET", "integration-secret".to_string()),
        (
            "REPO_DROP_REDIRECT_URI",
            "http://localhost:3000/oauth/callback".to_string(),
        ),
        ("REPO_DROP_TOKEN_URL", format!("{provider_uri}{TOKEN_PATH}")),
        ("REPO_DROP_API_BASE_URL", provider_uri.to_string()),
        ("REPO_DROP_GENERATION_API_KEY", "gen-key".to_string()),
        (
            "REPO_DROP_GENERATION_ENDPOINT",
            format!("{provider_uri}{GENERATE_PATH}"),
        ),
        ("REPO_DROP_STEP_TIMEOUT_SECS", "5".to_string()),
    ]
    .into_iter()
    .collect();

    let config = Config::from_lookup(|key| vars.get(key).cloned()).expect("invalid test config");
    config.validate().expect("test config does not validate");
    config
}

/// Bind an ephemeral port and serve the router on it
pub async fn spawn_app(config: Config) -> TestApp {
    let config = Arc::new(config);
    let registry = Arc::new(InMemoryRegistry::new(config.flow.task_ttl));
    let flow = Arc::new(
        FlowController::new(config.clone(), registry.clone() as Arc<dyn TaskRegistry>)
            .expect("failed to build flow controller"),
    );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let address = listener.local_addr().expect("listener has no address");

    let shutdown = CancellationToken::new();
    let router = api::create_router(flow, config);
    let handle = tokio::spawn(api::serve(listener, router, shutdown.clone()));

    // The browser follows redirects; the tests inspect them instead.
    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build HTTP client");

    TestApp {
        address,
        registry,
        shutdown,
        handle,
        http,
    }
}

/// Pull the `state` parameter out of a provider redirect
pub fn state_from_redirect(response: &reqwest::Response) -> String {
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("redirect without Location")
        .to_str()
        .expect("non-ASCII Location");
    url::Url::parse(location)
        .expect("Location is not a URL")
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("redirect without state")
}
