// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedRequest type for POST /embed
//!
//! The text is accepted either as a JSON body or as the `text` query
//! parameter. A non-empty query parameter wins when both are present; an
//! empty `?text=` counts as absent.

use crate::api::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;

/// Request body for POST /embed
///
/// # Example
/// ```json
/// { "text": "hello world" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedRequest {
    /// Text to embed
    pub text: String,
}

/// Query string for POST /embed?text=...
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbedQuery {
    pub text: Option<String>,
}

impl EmbedRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Builds the request from the query string and raw body
    ///
    /// # Errors
    /// - `ValidationError` when no text is supplied or it has the wrong type
    /// - `InvalidRequest` when the body is not parseable JSON
    pub fn from_parts(query: EmbedQuery, body: &[u8]) -> Result<Self, ApiError> {
        if let Some(text) = query.text.filter(|text| !text.is_empty()) {
            return Ok(Self { text });
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::validation("text", "text is required"));
        }

        serde_json::from_slice::<EmbedRequest>(body).map_err(|e| match e.classify() {
            Category::Syntax | Category::Eof | Category::Io => {
                ApiError::InvalidRequest(format!("Malformed JSON body: {}", e))
            }
            // serde's data errors quote the offending value, keep it out of logs
            Category::Data if e.to_string().starts_with("missing field") => {
                ApiError::validation("text", "text is required")
            }
            Category::Data => ApiError::validation(
                "text",
                format!(
                    "text must be a JSON string (line {} column {})",
                    e.line(),
                    e.column()
                ),
            ),
        })
    }

    /// Validates the embed request
    ///
    /// Text must contain at least one non-whitespace character. Length
    /// limits belong to the provider's token window.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.text.trim().is_empty() {
            return Err(ApiError::validation(
                "text",
                "text cannot be empty or contain only whitespace",
            ));
        }
        Ok(())
    }
}
