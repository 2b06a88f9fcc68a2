// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Route registration, GET /health and GET /info

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use embeddings_service::api::{create_app, AppState, ErrorResponse, InfoResponse};
use embeddings_service::embeddings::HashEmbeddingProvider;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

fn app() -> Router {
    let provider = HashEmbeddingProvider::with_name("smoke-model", 384).unwrap();
    create_app(AppState::new(Arc::new(provider)))
}

async fn send(app: Router, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_health_returns_constant_payload() {
    let (status, body) = send(app(), Method::GET, "/health", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, json!({"status": "ok", "service": "embeddings"}));
}

#[tokio::test]
async fn test_health_unaffected_by_request_history() {
    let app = app();

    let (before_status, before) = send(app.clone(), Method::GET, "/health", Body::empty()).await;

    // A mix of good and bad embed requests in between
    let _ = send(
        app.clone(),
        Method::POST,
        "/embed",
        Body::from(r#"{"text": "hello world"}"#),
    )
    .await;
    let _ = send(app.clone(), Method::POST, "/embed", Body::from("{")).await;
    let _ = send(app.clone(), Method::POST, "/embed", Body::empty()).await;

    let (after_status, after) = send(app, Method::GET, "/health", Body::empty()).await;

    assert_eq!(before_status, StatusCode::OK);
    assert_eq!(after_status, StatusCode::OK);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_info_describes_provider() {
    let (status, body) = send(app(), Method::GET, "/info", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    let info: InfoResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(info.service, "embeddings");
    assert_eq!(info.model, "smoke-model");
    assert_eq!(info.backend, "hash");
    assert_eq!(info.dimension, 384);
    assert_eq!(info.max_tokens, None);
    assert!(!info.version.is_empty());
}

#[tokio::test]
async fn test_unknown_route_returns_structured_404() {
    let (status, body) = send(app(), Method::POST, "/v1/embeddings", Body::empty()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error_type, "not_found");
    assert!(error.message.contains("/v1/embeddings"));
}

#[tokio::test]
async fn test_wrong_methods_rejected() {
    let (status, _) = send(app(), Method::GET, "/embed", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(app(), Method::POST, "/health", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
