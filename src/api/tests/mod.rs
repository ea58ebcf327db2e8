use super::*;
use crate::downloader::test_helpers::{self, StandIn};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test MediaDownloader instance wrapped in Arc
async fn create_test_downloader(body: &str) -> (Arc<MediaDownloader>, StandIn, tempfile::TempDir) {
    let (downloader, stand_in, temp_dir) = test_helpers::create_test_downloader(body).await;
    (Arc::new(downloader), stand_in, temp_dir)
}

/// Router over `downloader` using its own configuration
fn app(downloader: &Arc<MediaDownloader>) -> Router {
    create_router(downloader.clone(), downloader.config.clone())
}

async fn body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_cors_enabled() {
    let (downloader, _stand_in, _temp_dir) =
        create_test_downloader(test_helpers::PROGRESS_SCRIPT).await;

    let mut config = (*downloader.config).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(downloader, Arc::new(config));

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
async fn test_cors_disabled() {
    let (downloader, _stand_in, _temp_dir) =
        create_test_downloader(test_helpers::PROGRESS_SCRIPT).await;

    let mut config = (*downloader.config).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_swagger_ui_can_be_disabled() {
    let (downloader, _stand_in, _temp_dir) =
        create_test_downloader(test_helpers::PROGRESS_SCRIPT).await;

    let mut config = (*downloader.config).clone();
    config.server.api.swagger_ui = false;
    let app = create_router(downloader, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_server_shuts_down_on_signal() {
    let (downloader, _stand_in, _temp_dir) =
        create_test_downloader(test_helpers::PROGRESS_SCRIPT).await;

    let mut config = (*downloader.config).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (trigger, signal) = tokio::sync::oneshot::channel::<()>();
    let api_handle = tokio::spawn({
        let downloader = downloader.clone();
        async move {
            start_api_server_with_shutdown(downloader, config, async move {
                signal.await.ok();
            })
            .await
        }
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    trigger.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(10), api_handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
    assert!(!downloader.is_accepting_jobs());
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let (downloader, _stand_in, _temp_dir) =
        create_test_downloader(test_helpers::PROGRESS_SCRIPT).await;

    // Occupy a port so the server cannot bind it
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = (*downloader.config).clone();
    config.server.api.bind_address = occupied.local_addr().unwrap();

    let result =
        start_api_server_with_shutdown(downloader, Arc::new(config), std::future::pending()).await;
    assert!(matches!(result, Err(crate::Error::Io(_))));
}
