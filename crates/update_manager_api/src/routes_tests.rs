//! Tests for routes module

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tempfile::TempDir;
use tower::ServiceExt;
use update_manager_core::ManagerConfig;

fn test_state(dir: &TempDir) -> AppState {
    AppState::new(ManagerConfig::from_base_dir(dir.path()))
}

#[test]
fn test_router_creation() {
    let state = AppState::default();
    let _router = create_router(state);
}

#[tokio::test]
async fn test_every_get_route_is_registered() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir);

    for uri in [
        "/",
        "/health",
        "/archives/list",
        "/builder/build",
        "/builder/output_files",
    ] {
        let response = create_router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = create_router(AppState::default())
        .oneshot(
            Request::builder()
                .uri("/archives/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let response = create_router(AppState::default())
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/inputs/serial-numbers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let response = create_router(AppState::default())
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/health")
                .header(header::ORIGIN, "http://operator.local")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_upload_body_limit_is_enforced() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).with_max_upload_bytes(64);

    let mut body = b"--limit\r\nContent-Disposition: form-data; name=\"files\"; \
        filename=\"big.deb\"\r\n\r\n"
        .to_vec();
    body.extend(vec![b'x'; 4096]);
    body.extend_from_slice(b"\r\n--limit--\r\n");

    let response = create_router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/builder/upload_debs")
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=limit")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!dir.path().join("debs/big.deb").exists());
}
