//! HTTP server module
//!
//! Serves the landing form, the flow start endpoints and the provider
//! callback, plus health and OpenAPI documentation routes.

use crate::flow::FlowController;
use crate::{Config, Result};
use axum::{Router, http::Request, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod html;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the router with all route definitions
///
/// # Routes
///
/// ## Flow
/// - `GET /` - Landing page with the prompt form
/// - `GET /image?prompt=&repo=` - Generate an image and redirect to the provider
/// - `GET /upload?repo=` - Redirect to the provider with the configured default image
/// - `GET /oauth/callback?code=&state=` - Finish the flow and show the result
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(flow: Arc<FlowController>, config: Arc<Config>) -> Router {
    let state = AppState::new(flow, config.clone());

    let router = Router::new()
        // Flow
        .route("/", get(routes::index))
        .route("/image", get(routes::start_image_flow))
        .route("/upload", get(routes::start_upload_flow))
        .route("/oauth/callback", get(routes::oauth_callback))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI serves its own copy of the document so it cannot clash with /openapi.json
    let router = if config.server.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    // Spans carry the path only; the callback query holds the code and state.
    router.with_state(state).layer(
        TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }),
    )
}

/// Serve `router` on an already-bound listener until `shutdown` is cancelled
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(listener: TcpListener, router: Router, shutdown: CancellationToken) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Start the server on the configured bind address.
///
/// Binds a TCP listener to `server.bind_address` and serves the router until
/// `shutdown` is cancelled.
///
/// # Example
///
/// ```no_run
/// use repo_drop::{Config, FlowController, InMemoryRegistry};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::from_env()?);
/// let registry = Arc::new(InMemoryRegistry::new(config.flow.task_ttl));
/// let flow = Arc::new(FlowController::new(config.clone(), registry)?);
///
/// // Blocks until the token is cancelled
/// repo_drop::api::start_api_server(flow, config, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    flow: Arc<FlowController>,
    config: Arc<Config>,
    shutdown: CancellationToken,
) -> Result<()> {
    let bind_address = config.server.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(flow, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(bind_address),
        "API server listening"
    );

    serve(listener, app, shutdown).await
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
