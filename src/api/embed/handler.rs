// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed HTTP handler

use crate::api::embed::{EmbedQuery, EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use tracing::debug;

/// POST /embed handler
///
/// Encodes one text with the process-wide embedding provider.
///
/// # Request
/// `{"text": "hello world"}` as the body, or `?text=hello%20world`
///
/// # Response Body
/// ```json
/// { "embedding": [0.1, 0.2, ...] }
/// ```
///
/// # Errors
/// - 400 when text is missing, blank, of the wrong type or the body is
///   malformed, or when the input is too long under the reject policy
/// - 413 when the body exceeds the configured limit
/// - 500 when the provider fails or returns a malformed vector
/// - 503 when the inference worker is unavailable
pub async fn embed_handler(
    State(state): State<AppState>,
    query: Result<Query<EmbedQuery>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let body = body?;

    let request = EmbedRequest::from_parts(query, &body)?;
    request.validate()?;

    debug!(chars = request.text.chars().count(), "Embedding request");

    let vector = state.provider.encode(&request.text).await?;

    let response = EmbedResponse::from(vector);
    response.validate(state.provider.dimension())?;

    Ok(Json(response))
}
