use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt; // for oneshot()


/// Helper to create a test service wrapped in Arc with its router
async fn test_app() -> (Router, Arc<SitemapService>, tempfile::TempDir) {
    let (service, temp_dir) = crate::service::test_helpers::create_test_service().await;
    let service = Arc::new(service);
    let app = create_router(service.clone(), service.config.clone());
    (app, service, temp_dir)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn api_server_serves_until_shutdown() {
    let (_app, service, _temp_dir) = test_app().await;

    // Port 0 = OS assigns a free port
    let mut config = (*service.config).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let api_handle = tokio::spawn(start_api_server(service, config, async {
        stop_rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (_app, service, _temp_dir) = test_app().await;

    let mut config = (*service.config).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn cors_headers_absent_when_disabled() {
    let (_app, service, _temp_dir) = test_app().await;

    let mut config = (*service.config).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[test]
fn cors_layer_accepts_specific_origins() {
    // Unparseable origins are skipped rather than rejected
    let _layer = build_cors_layer(&[
        "http://localhost:3000".to_string(),
        "bad\norigin".to_string(),
    ]);
}

#[tokio::test]
async fn swagger_ui_can_be_disabled() {
    let (_app, service, _temp_dir) = test_app().await;

    let mut config = (*service.config).clone();
    config.server.api.swagger_ui = false;
    let app = create_router(service, Arc::new(config));

    let response = app.oneshot(get_request("/swagger-ui/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn default_config_router_serves_both_openapi_documents() {
    let (_app, service, _temp_dir) = test_app().await;
    let config = Config::default();
    assert!(config.server.api.swagger_ui);

    let app = create_router(service, Arc::new(config));

    let response = app
        .clone()
        .oneshot(get_request("/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(SWAGGER_SPEC_PATH))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/tasks"].is_object());
}
