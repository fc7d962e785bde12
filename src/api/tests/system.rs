use super::*;
use crate::api::routes::HealthResponse;

#[tokio::test]
async fn test_health_reports_pending_tasks() {
    let (app, registry) = create_test_app("http://127.0.0.1:9");
    registry.create_task(Artifact::png("Zm9v"), "r".into()).await;
    registry.create_task(Artifact::png("Zm9v"), "s".into()).await;

    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(health.pending_tasks, 2);
}

#[tokio::test]
async fn test_openapi_spec_is_served() {
    let (app, _) = create_test_app("http://127.0.0.1:9");

    let response = get(app, "/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(doc["info"]["title"], "repo-drop");
    assert!(doc["paths"]["/oauth/callback"].is_object());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _) = create_test_app("http://127.0.0.1:9");
    let response = get(app, "/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
