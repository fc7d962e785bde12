use super::*;
use crate::registry::{InMemoryRegistry, TaskRegistry};
use crate::test_helpers::{create_test_controller, test_config};
use crate::types::Artifact;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use std::time::Duration;
use tower::ServiceExt;

mod system;

/// Router backed by a controller whose provider lives at `server_uri`
fn create_test_app(server_uri: &str) -> (Router, Arc<InMemoryRegistry>) {
    create_test_app_with(test_config(server_uri))
}

fn create_test_app_with(config: Config) -> (Router, Arc<InMemoryRegistry>) {
    let (controller, registry) = create_test_controller(config);
    let config = Arc::new(controller.config().clone());
    (create_router(controller, config), registry)
}

async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns_and_stops_on_shutdown() {
    let mut config = test_config("http://127.0.0.1:9");
    config.server.bind_address = "127.0.0.1:0".parse().unwrap();
    let (controller, _registry) = create_test_controller(config);
    let config = Arc::new(controller.config().clone());

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(start_api_server(controller, config, shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (app, _) = create_test_app("http://127.0.0.1:9");
    let response = get(app, "/swagger-ui/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut config = test_config("http://127.0.0.1:9");
    config.server.swagger_ui = false;
    let (app, _) = create_test_app_with(config);
    let response = get(app, "/swagger-ui/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
