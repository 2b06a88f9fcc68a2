// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedResponse type for POST /embed

use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// Inference runs in f32; components are widened to f64 on the wire.
///
/// # Example
/// ```json
/// { "embedding": [0.0123, -0.0456, ...] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    pub embedding: Vec<f64>,
}

impl EmbedResponse {
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    /// Checks the vector against the provider's fixed dimensionality
    ///
    /// # Returns
    /// - `Err(ApiError::InternalError)` on a length mismatch or a
    ///   non-finite component
    pub fn validate(&self, expected_dimension: usize) -> Result<(), ApiError> {
        if self.embedding.len() != expected_dimension {
            return Err(ApiError::InternalError(format!(
                "embedding must be exactly {} dimensions (got {})",
                expected_dimension,
                self.embedding.len()
            )));
        }

        if let Some(index) = self.embedding.iter().position(|v| !v.is_finite()) {
            return Err(ApiError::InternalError(format!(
                "embedding contains a non-finite value at index {}",
                index
            )));
        }

        Ok(())
    }
}

impl From<Vec<f32>> for EmbedResponse {
    fn from(vector: Vec<f32>) -> Self {
        Self {
            embedding: vector.into_iter().map(f64::from).collect(),
        }
    }
}
