//! Flow orchestration
//!
//! A flow has two halves separated by an unbounded wait while the user
//! authenticates with the provider:
//!
//! 1. **Start** ([`FlowController::start`] / [`FlowController::start_with_prompt`]):
//!    optionally generate the artifact, register a [`Task`](crate::types::Task),
//!    and hand back the authorization URL to redirect to.
//! 2. **Complete** ([`FlowController::complete`]): validate the callback, take
//!    the task, then run exchange → identity → persist. Each step takes the
//!    previous step's output as an argument, so no step can run before the data
//!    it needs exists.
//!
//! Every path through `complete` returns exactly one `Result`, which the HTTP
//! layer turns into exactly one response.

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{Error, Result, Step};
use crate::generation;
use crate::identity;
use crate::oauth::{self, AuthorizationCallback};
use crate::persistence;
use crate::registry::TaskRegistry;
use crate::types::{Artifact, Completion, FlowStage, Task, TaskToken};
use std::sync::Arc;
use tracing::Instrument;
use url::Url;

/// Runs flows against the configured provider
///
/// Cheap to share behind an `Arc`; holds no per-flow state of its own. All
/// in-flight state lives in the injected [`TaskRegistry`].
pub struct FlowController {
    config: Arc<Config>,
    client: ApiClient,
    registry: Arc<dyn TaskRegistry>,
}

impl FlowController {
    /// Create a controller using `registry` for task correlation
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: Arc<Config>, registry: Arc<dyn TaskRegistry>) -> Result<Self> {
        let client = ApiClient::new(&config.provider.user_agent, config.flow.step_timeout)?;
        Ok(Self {
            config,
            client,
            registry,
        })
    }

    /// The task registry this controller correlates callbacks with
    pub fn registry(&self) -> &Arc<dyn TaskRegistry> {
        &self.registry
    }

    /// The configuration flows run with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a task for `artifact` and return the provider URL to redirect to
    pub async fn start(&self, artifact: Artifact, target_resource: String) -> Result<Url> {
        let mime_type = artifact.mime_type.clone();
        let token = self.registry.create_task(artifact, target_resource).await;
        tracing::debug!(
            token = token.short(),
            stage = %FlowStage::Created,
            mime_type = %mime_type,
            "task registered"
        );

        match oauth::authorization_url(&self.config.provider, &token) {
            Ok(url) => {
                tracing::info!(
                    token = token.short(),
                    stage = %FlowStage::AwaitingCallback,
                    "flow started, redirecting to provider"
                );
                Ok(url)
            }
            Err(e) => {
                // Nothing will ever call back for this token.
                self.registry.take(&token).await;
                Err(e)
            }
        }
    }

    /// Generate an artifact from `prompt`, then start a flow for it
    ///
    /// No task is registered when generation fails.
    pub async fn start_with_prompt(&self, prompt: &str, target_resource: String) -> Result<Url> {
        let image =
            generation::generate_image(&self.client, &self.config.generation, prompt).await?;
        tracing::debug!(
            mime_type = %image.mime_type,
            bytes = image.data.len(),
            "image generated"
        );

        self.start(image, target_resource).await
    }

    /// Handle the provider callback and drive the flow to completion
    ///
    /// Fails with a 404-class error, without any outbound call, when `state`
    /// or `code` is missing, when the provider reported an error, or when
    /// `state` matches no live task. The task is consumed on the first valid
    /// callback, so replays are rejected the same way.
    pub async fn complete(&self, callback: AuthorizationCallback) -> Result<Completion> {
        let state = non_empty(callback.state).ok_or(Error::MissingParameter("state"))?;
        let token = TaskToken::from_untrusted(state);

        if let Some(error) = non_empty(callback.error) {
            // The user declined; drop the task so the token cannot be reused.
            if self.registry.take(&token).await.is_none() {
                return Err(Error::UnknownState);
            }
            tracing::info!(token = token.short(), error = %error, "provider denied authorization");
            return Err(Error::AuthorizationDenied(
                callback.error_description.unwrap_or(error),
            ));
        }

        let code = non_empty(callback.code).ok_or(Error::MissingParameter("code"))?;
        let task = self.registry.take(&token).await.ok_or_else(|| {
            tracing::warn!(token = token.short(), "callback state matches no live task");
            Error::UnknownState
        })?;

        let span = tracing::info_span!("flow", token = token.short(), repo = %task.target_resource);
        self.run_to_completion(&code, task).instrument(span).await
    }

    async fn run_to_completion(&self, code: &str, task: Task) -> Result<Completion> {
        let mut stage = FlowStage::CodeReceived;
        let outcome = tokio::time::timeout(
            self.config.flow.flow_timeout,
            self.run_pipeline(code, &task, &mut stage),
        )
        .await;
        let result = outcome.unwrap_or_else(|_| {
            Err(Error::FlowTimeout {
                step: step_for(stage),
            })
        });

        match &result {
            Ok(completion) => tracing::info!(
                stage = %FlowStage::Completed,
                owner = %completion.outcome.owner,
                path = %completion.outcome.path,
                "flow completed"
            ),
            Err(e) => tracing::warn!(
                stage = %FlowStage::Failed,
                failed_during = %stage,
                error = %e,
                "flow failed"
            ),
        }

        result
    }

    async fn run_pipeline(
        &self,
        code: &str,
        task: &Task,
        stage: &mut FlowStage,
    ) -> Result<Completion> {
        let provider = &self.config.provider;

        *stage = FlowStage::Exchanging;
        let credential = oauth::exchange_code(&self.client, provider, code).await?;
        *stage = FlowStage::CredentialObtained;
        tracing::debug!(stage = %stage, "code exchanged");

        *stage = FlowStage::ResolvingIdentity;
        let identity = identity::resolve_identity(&self.client, provider, &credential).await?;
        *stage = FlowStage::IdentityResolved;
        tracing::debug!(stage = %stage, login = %identity.login, "identity resolved");

        *stage = FlowStage::Persisting;
        let outcome = persistence::persist_artifact(
            &self.client,
            provider,
            &self.config.upload,
            &credential,
            &identity,
            task,
        )
        .await?;
        *stage = FlowStage::Completed;

        Ok(Completion {
            outcome,
            artifact: task.artifact.clone(),
        })
    }
}

/// The outbound call that is in flight during `stage`
fn step_for(stage: FlowStage) -> Step {
    match stage {
        FlowStage::ResolvingIdentity | FlowStage::CredentialObtained => Step::Identity,
        FlowStage::Persisting | FlowStage::IdentityResolved => Step::Persist,
        _ => Step::Exchange,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
