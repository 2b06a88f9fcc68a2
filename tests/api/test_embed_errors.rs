// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Error Handling Tests for POST /embed
//!
//! Verifies that:
//! - Input problems are reported as 4xx with a descriptive message
//! - Provider failures are reported as 5xx with a descriptive message
//! - The service keeps answering after every kind of failure

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use embeddings_service::api::{
    create_app, create_app_with_body_limit, AppState, ErrorResponse,
};
use embeddings_service::embeddings::{
    EmbeddingError, EmbeddingProvider, HashEmbeddingProvider,
};
use std::sync::Arc;
use tower::ServiceExt;

/// Provider that always fails with the configured error
struct FailingProvider {
    error: EmbeddingError,
}

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    async fn encode(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(self.error.clone())
    }

    fn dimension(&self) -> usize {
        384
    }

    fn model_name(&self) -> &str {
        "failing"
    }

    fn backend(&self) -> &'static str {
        "stub"
    }
}

/// Provider that returns a fixed vector regardless of input
struct FixedProvider {
    vector: Vec<f32>,
    dimension: usize,
}

#[async_trait]
impl EmbeddingProvider for FixedProvider {
    async fn encode(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vector.clone())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn backend(&self) -> &'static str {
        "stub"
    }
}

fn hash_app() -> Router {
    create_app(AppState::new(Arc::new(
        HashEmbeddingProvider::new(384).unwrap(),
    )))
}

fn failing_app(error: EmbeddingError) -> Router {
    create_app(AppState::new(Arc::new(FailingProvider { error })))
}

async fn post(app: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, ErrorResponse) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "expected structured error body, got {:?}: {}",
            String::from_utf8_lossy(&bytes),
            e
        )
    });
    (status, error)
}

//
// INPUT ERRORS (4xx)
//

#[tokio::test]
async fn test_missing_body_is_client_error() {
    let (status, error) = post(hash_app(), "/embed", Body::empty()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error_type, "validation_error");
    assert_eq!(error.message, "text is required");
    let details = error.details.unwrap();
    assert_eq!(details["field"], serde_json::json!("text"));
}

#[tokio::test]
async fn test_missing_text_field_is_client_error() {
    let (status, error) = post(hash_app(), "/embed", r#"{"content": "hello"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error_type, "validation_error");
    assert!(error.message.contains("text"), "{}", error.message);
}

#[tokio::test]
async fn test_wrong_shape_is_client_error() {
    for body in [
        r#"{"text": null}"#,
        r#"{"text": 123}"#,
        r#"{"text": {"nested": true}}"#,
        r#""hello""#,
    ] {
        let (status, error) = post(hash_app(), "/embed", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(error.error_type, "validation_error", "body: {}", body);
    }
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let (status, error) = post(hash_app(), "/embed", r#"{"text": "#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error_type, "invalid_request");
    assert!(error.message.contains("Malformed JSON"));
}

#[tokio::test]
async fn test_blank_text_is_client_error() {
    let (status, error) = post(hash_app(), "/embed", r#"{"text": "   "}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error_type, "validation_error");

    let (status, _) = post(hash_app(), "/embed?text=", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = create_app_with_body_limit(
        AppState::new(Arc::new(HashEmbeddingProvider::new(384).unwrap())),
        64,
    );
    let body = serde_json::json!({ "text": "x".repeat(1024) }).to_string();

    let (status, error) = post(app, "/embed", body).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error.error_type, "payload_too_large");
}

#[tokio::test]
async fn test_input_too_long_is_client_error() {
    let app = failing_app(EmbeddingError::InputTooLong { max_tokens: 256 });

    let (status, error) = post(app, "/embed", r#"{"text": "very long text"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error_type, "validation_error");
    assert!(error.message.contains("256"));
}

//
// PROVIDER ERRORS (5xx)
//

#[tokio::test]
async fn test_inference_failure_is_server_error() {
    let app = failing_app(EmbeddingError::Inference("out of memory".to_string()));

    let (status, error) = post(app, "/embed", r#"{"text": "hello"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.error_type, "internal_error");
    assert!(error.message.contains("out of memory"));
}

#[tokio::test]
async fn test_tokenization_failure_is_server_error() {
    let app = failing_app(EmbeddingError::Tokenization("unsupported character".to_string()));

    let (status, error) = post(app, "/embed", r#"{"text": "\u0000"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error.message.contains("unsupported character"));
}

#[tokio::test]
async fn test_unavailable_provider_is_503() {
    let app = failing_app(EmbeddingError::Unavailable("worker crashed".to_string()));

    let (status, error) = post(app, "/embed", r#"{"text": "hello"}"#).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error.error_type, "service_unavailable");
}

#[tokio::test]
async fn test_wrong_dimension_from_provider_is_server_error() {
    let app = create_app(AppState::new(Arc::new(FixedProvider {
        vector: vec![0.1; 10],
        dimension: 384,
    })));

    let (status, error) = post(app, "/embed", r#"{"text": "hello"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error.message.contains("384"));
}

#[tokio::test]
async fn test_non_finite_from_provider_is_server_error() {
    let app = create_app(AppState::new(Arc::new(FixedProvider {
        vector: vec![0.1, f32::INFINITY, 0.3],
        dimension: 3,
    })));

    let (status, error) = post(app, "/embed", r#"{"text": "hello"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error.message.contains("non-finite"));
}

#[tokio::test]
async fn test_input_errors_never_reach_provider() {
    // A failing provider would turn any call into a 5xx
    let app = failing_app(EmbeddingError::Inference("should not be called".to_string()));

    let (status, _) = post(app, "/embed", Body::empty()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_service_survives_errors() {
    let app = failing_app(EmbeddingError::Inference("boom".to_string()));

    for _ in 0..5 {
        let (status, _) = post(app.clone(), "/embed", r#"{"text": "hello"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
