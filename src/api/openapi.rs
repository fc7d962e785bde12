//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI document for the repo-drop HTTP surface using utoipa
//! for compile-time document generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the repo-drop HTTP surface
///
/// Served at `/openapi.json`, and through `/swagger-ui` when enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "repo-drop",
        description = "Generate an image (or use a default one) and commit it into a GitHub repository after OAuth authorization",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Flow
        crate::api::routes::index,
        crate::api::routes::start_image_flow,
        crate::api::routes::start_upload_flow,
        crate::api::routes::oauth_callback,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(crate::api::routes::HealthResponse)
    ),
    tags(
        (name = "flow", description = "Start a flow and receive the provider callback"),
        (name = "system", description = "Health and API documentation")
    )
)]
pub struct ApiDoc;
