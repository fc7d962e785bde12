//! Correlation registry for in-flight tasks
//!
//! A flow registers a [`Task`] before redirecting the user to the provider and
//! the callback takes it back by token. The registry is injected into the
//! flow controller as `Arc<dyn TaskRegistry>` so the in-memory map can be
//! swapped for another backing store without touching the flow code.
//!
//! Tokens are single-use: [`TaskRegistry::take`] removes the task, so a
//! replayed callback finds nothing. Tasks older than the configured TTL are
//! invisible to lookups and are dropped by [`TaskRegistry::evict_expired`].

use crate::types::{Artifact, Task, TaskToken};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Storage for tasks awaiting their authorization callback
#[async_trait]
pub trait TaskRegistry: Send + Sync {
    /// Register a task for `artifact` / `target_resource` and return its fresh token
    async fn create_task(&self, artifact: Artifact, target_resource: String) -> TaskToken;

    /// Look up a live task without consuming it
    async fn find_by_token(&self, token: &TaskToken) -> Option<Task>;

    /// Look up a live task and remove it, so the token cannot be used again
    async fn take(&self, token: &TaskToken) -> Option<Task>;

    /// Remove every task older than the TTL, returning how many were dropped
    async fn evict_expired(&self) -> usize;

    /// Number of tasks currently held (expired-but-unswept included)
    async fn len(&self) -> usize;

    /// Returns true when no tasks are held
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Process-local registry backed by a `HashMap`
///
/// Lives as long as the server; nothing survives a restart.
pub struct InMemoryRegistry {
    tasks: Mutex<HashMap<TaskToken, Task>>,
    ttl: Duration,
}

impl InMemoryRegistry {
    /// Create an empty registry whose tasks expire after `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl TaskRegistry for InMemoryRegistry {
    async fn create_task(&self, artifact: Artifact, target_resource: String) -> TaskToken {
        let mut tasks = self.tasks.lock().await;

        // At most one task per token.
        let token = loop {
            let candidate = TaskToken::generate();
            if !tasks.contains_key(&candidate) {
                break candidate;
            }
            tracing::warn!("generated token collided with an in-flight task, regenerating");
        };

        tasks.insert(
            token.clone(),
            Task {
                token: token.clone(),
                artifact,
                target_resource,
                created_at: Instant::now(),
            },
        );

        tracing::debug!(token = token.short(), in_flight = tasks.len(), "task registered");
        token
    }

    async fn find_by_token(&self, token: &TaskToken) -> Option<Task> {
        let tasks = self.tasks.lock().await;
        tasks
            .get(token)
            .filter(|task| !task.is_expired(self.ttl, Instant::now()))
            .cloned()
    }

    async fn take(&self, token: &TaskToken) -> Option<Task> {
        let task = self.tasks.lock().await.remove(token)?;

        if task.is_expired(self.ttl, Instant::now()) {
            tracing::info!(token = token.short(), "callback arrived for an expired task");
            return None;
        }

        Some(task)
    }

    async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|_, task| !task.is_expired(self.ttl, now));
        before - tasks.len()
    }

    async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }
}
