// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::api::http_server::AppState;
use crate::api::ApiError;
use crate::version::{SERVICE_NAME, VERSION};
use axum::extract::State;
use axum::http::Uri;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: SERVICE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfoResponse {
    pub service: String,
    pub version: String,
    pub model: String,
    pub backend: String,
    pub dimension: usize,
    pub max_tokens: Option<usize>,
}

/// GET /health
///
/// Constant while the process is alive; never touches the provider.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// GET /info
pub async fn info_handler(State(state): State<AppState>) -> Json<InfoResponse> {
    let provider = &state.provider;
    Json(InfoResponse {
        service: SERVICE_NAME.to_string(),
        version: VERSION.to_string(),
        model: provider.model_name().to_string(),
        backend: provider.backend().to_string(),
        dimension: provider.dimension(),
        max_tokens: provider.max_tokens(),
    })
}

pub async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
