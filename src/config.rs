//! Configuration types for repo-drop
//!
//! Configuration is loaded once at startup and shared immutably (behind an
//! `Arc`) for the lifetime of the server.

use crate::error::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

/// A 1x1 transparent PNG, base64-encoded; used when no default artifact is configured.
pub const PLACEHOLDER_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Main configuration for the server
///
/// Fields are organized into sub-configs:
/// - [`server`](ServerConfig) - bind address and documentation routes
/// - [`provider`](ProviderConfig) - OAuth client and provider endpoints
/// - [`generation`](GenerationConfig) - image generation API
/// - [`upload`](UploadConfig) - where and how the artifact is committed
/// - [`flow`](FlowConfig) - task expiry and timeouts
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// OAuth provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Image generation API settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Repository write settings
    #[serde(default)]
    pub upload: UploadConfig,

    /// Flow lifetime settings
    #[serde(default)]
    pub flow: FlowConfig,
}

/// HTTP server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            swagger_ui: true,
        }
    }
}

/// OAuth provider configuration (GitHub-compatible endpoints)
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth application client ID
    #[serde(default)]
    pub client_id: String,

    /// OAuth application client secret
    #[serde(default)]
    pub client_secret: String,

    /// Requested scope (default: "repo")
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Callback URL registered with the provider, pointing at `/oauth/callback`
    #[serde(default)]
    pub redirect_uri: String,

    /// Authorization endpoint the user agent is redirected to
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    /// Token endpoint for the code exchange
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// REST API base URL for identity and content calls
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Value of the `X-GitHub-Api-Version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// `User-Agent` sent on every provider call (the REST API rejects requests without one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            scope: default_scope(),
            redirect_uri: String::new(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            user_agent: default_user_agent(),
        }
    }
}

// Hand-written so the client secret never reaches a log line.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret_set", &!self.client_secret.is_empty())
            .field("scope", &self.scope)
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Image generation API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API key (None = `/image` is disabled and answers 500)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Full `generateContent` endpoint URL
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_generation_endpoint(),
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key_set", &self.api_key.is_some())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Repository write configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Branch the artifact is committed to (default: "main")
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Path of the file inside the repository (default: "image.png")
    #[serde(default = "default_upload_path")]
    pub path: String,

    /// Commit message
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Base64 artifact used by the direct `/upload` flow
    #[serde(default = "default_artifact")]
    pub default_artifact: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            branch: default_branch(),
            path: default_upload_path(),
            commit_message: default_commit_message(),
            default_artifact: default_artifact(),
        }
    }
}

/// Task expiry and timeout configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowConfig {
    /// How long a task waits for its callback before it is evicted (default: 600s)
    #[serde(default = "default_task_ttl", with = "duration_serde")]
    pub task_ttl: Duration,

    /// How often expired tasks are swept (default: 60s)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    pub sweep_interval: Duration,

    /// Timeout for a single outbound call (default: 30s)
    #[serde(default = "default_step_timeout", with = "duration_serde")]
    pub step_timeout: Duration,

    /// Timeout for the whole post-callback pipeline (default: 120s)
    #[serde(default = "default_flow_timeout", with = "duration_serde")]
    pub flow_timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            task_ttl: default_task_ttl(),
            sweep_interval: default_sweep_interval(),
            step_timeout: default_step_timeout(),
            flow_timeout: default_flow_timeout(),
        }
    }
}

impl Config {
    /// Build a configuration from `REPO_DROP_*` environment variables
    ///
    /// Unset variables keep their defaults. Call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `REPO_DROP_BIND_ADDRESS` | `server.bind_address` |
    /// | `REPO_DROP_CLIENT_ID` | `provider.client_id` |
    /// | `REPO_DROP_CLIENT_SECRET` | `provider.client_secret` |
    /// | `REPO_DROP_REDIRECT_URI` | `provider.redirect_uri` |
    /// | `REPO_DROP_SCOPE` | `provider.scope` |
    /// | `REPO_DROP_AUTHORIZE_URL` | `provider.authorize_url` |
    /// | `REPO_DROP_TOKEN_URL` | `provider.token_url` |
    /// | `REPO_DROP_API_BASE_URL` | `provider.api_base_url` |
    /// | `REPO_DROP_GENERATION_API_KEY` | `generation.api_key` |
    /// | `REPO_DROP_GENERATION_ENDPOINT` | `generation.endpoint` |
    /// | `REPO_DROP_BRANCH` | `upload.branch` |
    /// | `REPO_DROP_UPLOAD_PATH` | `upload.path` |
    /// | `REPO_DROP_COMMIT_MESSAGE` | `upload.commit_message` |
    /// | `REPO_DROP_DEFAULT_ARTIFACT` | `upload.default_artifact` |
    /// | `REPO_DROP_TASK_TTL_SECS` | `flow.task_ttl` |
    /// | `REPO_DROP_STEP_TIMEOUT_SECS` | `flow.step_timeout` |
    /// | `REPO_DROP_FLOW_TIMEOUT_SECS` | `flow.flow_timeout` |
    /// | `REPO_DROP_SWAGGER_UI` | `server.swagger_ui` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("REPO_DROP_BIND_ADDRESS") {
            config.server.bind_address = addr.parse().map_err(|e| {
                Error::config("bind_address", format!("invalid socket address '{addr}': {e}"))
            })?;
        }
        if let Some(v) = lookup("REPO_DROP_CLIENT_ID") {
            config.provider.client_id = v;
        }
        if let Some(v) = lookup("REPO_DROP_CLIENT_SECRET") {
            config.provider.client_secret = v;
        }
        if let Some(v) = lookup("REPO_DROP_REDIRECT_URI") {
            config.provider.redirect_uri = v;
        }
        if let Some(v) = lookup("REPO_DROP_SCOPE") {
            config.provider.scope = v;
        }
        if let Some(v) = lookup("REPO_DROP_AUTHORIZE_URL") {
            config.provider.authorize_url = v;
        }
        if let Some(v) = lookup("REPO_DROP_TOKEN_URL") {
            config.provider.token_url = v;
        }
        if let Some(v) = lookup("REPO_DROP_API_BASE_URL") {
            config.provider.api_base_url = v;
        }
        if let Some(v) = lookup("REPO_DROP_SWAGGER_UI") {
            config.server.swagger_ui = parse_bool("swagger_ui", &v)?;
        }
        config.generation.api_key = lookup("REPO_DROP_GENERATION_API_KEY").filter(|k| !k.is_empty());
        if let Some(v) = lookup("REPO_DROP_GENERATION_ENDPOINT") {
            config.generation.endpoint = v;
        }
        if let Some(v) = lookup("REPO_DROP_BRANCH") {
            config.upload.branch = v;
        }
        if let Some(v) = lookup("REPO_DROP_UPLOAD_PATH") {
            config.upload.path = v;
        }
        if let Some(v) = lookup("REPO_DROP_COMMIT_MESSAGE") {
            config.upload.commit_message = v;
        }
        if let Some(v) = lookup("REPO_DROP_DEFAULT_ARTIFACT") {
            config.upload.default_artifact = v;
        }
        if let Some(v) = lookup("REPO_DROP_TASK_TTL_SECS") {
            config.flow.task_ttl = parse_secs("task_ttl", &v)?;
        }
        if let Some(v) = lookup("REPO_DROP_STEP_TIMEOUT_SECS") {
            config.flow.step_timeout = parse_secs("step_timeout", &v)?;
        }
        if let Some(v) = lookup("REPO_DROP_FLOW_TIMEOUT_SECS") {
            config.flow.flow_timeout = parse_secs("flow_timeout", &v)?;
        }

        Ok(config)
    }

    /// Check that the settings needed to run a flow are present and well-formed
    pub fn validate(&self) -> Result<()> {
        let provider = &self.provider;
        if provider.client_id.trim().is_empty() {
            return Err(Error::config("client_id", "client_id must not be empty"));
        }
        if provider.client_secret.trim().is_empty() {
            return Err(Error::config(
                "client_secret",
                "client_secret must not be empty",
            ));
        }

        for (key, value) in [
            ("redirect_uri", &provider.redirect_uri),
            ("authorize_url", &provider.authorize_url),
            ("token_url", &provider.token_url),
            ("api_base_url", &provider.api_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::config(key, format!("invalid URL '{value}': {e}")))?;
        }

        if self.upload.path.trim_matches('/').is_empty() {
            return Err(Error::config("path", "upload path must not be empty"));
        }
        base64::engine::general_purpose::STANDARD
            .decode(&self.upload.default_artifact)
            .map_err(|e| {
                Error::config("default_artifact", format!("not valid base64: {e}"))
            })?;

        if self.flow.task_ttl.is_zero() {
            return Err(Error::config("task_ttl", "task_ttl must be greater than zero"));
        }
        if self.flow.step_timeout.is_zero() || self.flow.flow_timeout.is_zero() {
            return Err(Error::config("flow", "timeouts must be greater than zero"));
        }
        if self.flow.sweep_interval.is_zero() {
            return Err(Error::config(
                "sweep_interval",
                "sweep_interval must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| Error::config(key, format!("invalid number of seconds '{value}': {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(key, format!("expected a boolean, got '{value}'"))),
    }
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_true() -> bool {
    true
}

fn default_scope() -> String {
    "repo".to_string()
}

fn default_authorize_url() -> String {
    "https://github.com/login/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://github.com/login/oauth/access_token".to_string()
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_api_version() -> String {
    "2022-11-28".to_string()
}

fn default_user_agent() -> String {
    concat!("repo-drop/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_generation_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-preview-image-generation:generateContent".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_upload_path() -> String {
    "image.png".to_string()
}

fn default_commit_message() -> String {
    "Upload image via repo-drop".to_string()
}

fn default_artifact() -> String {
    PLACEHOLDER_PNG_BASE64.to_string()
}

fn default_task_ttl() -> Duration {
    Duration::from_secs(600)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_step_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_flow_timeout() -> Duration {
    Duration::from_secs(120)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
