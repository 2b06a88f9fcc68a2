// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for embedding generation
//!
//! Load failures are reported through `anyhow` at startup and are fatal.
//! Everything here is a per-request failure raised by a provider after it
//! has been initialized.

use thiserror::Error;

/// Errors that can occur while encoding a single text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Input exceeds the model's token window and the reject policy is active
    #[error("Input is too long: exceeds the model limit of {max_tokens} tokens")]
    InputTooLong { max_tokens: usize },

    /// Tokenizer could not process the input
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    /// Inference backend raised during the forward pass
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Model produced a vector of the wrong length
    #[error("Unexpected embedding dimension: {actual} (expected {expected})")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Model produced NaN or infinite values
    #[error("Embedding contains a non-finite value at index {index}")]
    NonFinite { index: usize },

    /// Inference worker could not be reached
    #[error("Embedding provider unavailable: {0}")]
    Unavailable(String),
}

impl EmbeddingError {
    /// True when the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, EmbeddingError::InputTooLong { .. })
    }
}
