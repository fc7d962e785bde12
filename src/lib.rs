//! # repo-drop
//!
//! Small web service that commits an image into a GitHub repository on the
//! user's behalf.
//!
//! A flow starts when the user submits a prompt (or asks for the default
//! image), which registers a task and redirects the browser to the provider's
//! authorization page. When the provider redirects back, the task is looked up
//! by its `state` token, the code is exchanged for a credential, the user's
//! login is resolved and the image is committed with a single contents `PUT`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use repo_drop::{Config, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!
//!     // Serve until SIGINT/SIGTERM
//!     run_with_shutdown(config).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP server module
pub mod api;
/// Outbound HTTP client shared by every provider call
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Flow orchestration
pub mod flow;
/// Image generation
pub mod generation;
/// Authenticated user lookup
pub mod identity;
/// OAuth authorization-code grant
pub mod oauth;
/// Committing the artifact to the repository
pub mod persistence;
/// In-flight task registry
pub mod registry;
/// Expired task eviction
pub mod sweeper;
/// Core types
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result, Step, ToHttpStatus};
pub use flow::FlowController;
pub use registry::{InMemoryRegistry, TaskRegistry};
pub use sweeper::TaskSweeper;
pub use types::{Artifact, Completion, CommitOutcome, Identity, Task, TaskToken};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run the service until a shutdown signal arrives
///
/// Validates `config`, starts the task sweeper and the HTTP server, then waits
/// for SIGTERM or SIGINT (Ctrl+C on non-unix platforms). On signal the server
/// stops accepting connections, lets in-flight requests finish, and the
/// sweeper is stopped.
///
/// Flows still awaiting their callback are lost on shutdown.
pub async fn run_with_shutdown(config: Config) -> Result<()> {
    config.validate()?;
    let config = Arc::new(config);

    let registry: Arc<dyn TaskRegistry> = Arc::new(InMemoryRegistry::new(config.flow.task_ttl));
    let flow = Arc::new(FlowController::new(config.clone(), registry.clone())?);

    let shutdown = CancellationToken::new();
    let sweeper = TaskSweeper::new(registry, config.flow.sweep_interval).spawn(shutdown.clone());

    let signal = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            shutdown.cancel();
        }
    });

    let result = api::start_api_server(flow, config, shutdown.clone()).await;

    // The server may have failed on its own (e.g. bind error); stop everything else too.
    shutdown.cancel();
    signal.abort();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "task sweeper did not stop cleanly");
    }

    result
}

/// Resolve once the process is asked to stop, logging which request arrived
async fn wait_for_signal() {
    let received = first_signal(terminate(), interrupt()).await;
    tracing::info!(signal = received, "shutdown requested");
}

/// Name of whichever shutdown request completes first
async fn first_signal(
    terminate: impl std::future::Future<Output = ()>,
    interrupt: impl std::future::Future<Output = ()>,
) -> &'static str {
    tokio::select! {
        () = terminate => "terminate",
        () = interrupt => "interrupt",
    }
}

/// Ctrl+C; never resolves if the handler cannot be installed
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// SIGTERM; never resolves if the handler cannot be registered
#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
