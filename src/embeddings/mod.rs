// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding providers
//!
//! A provider is loaded once at startup and shared read-only by every
//! request. The backend is chosen at deploy time, never per request.

pub mod errors;
pub mod hashed;
pub mod onnx_model;
pub mod pooling;

pub use errors::EmbeddingError;
pub use hashed::{HashEmbeddingProvider, HASH_MODEL_NAME};
pub use onnx_model::{OnnxEmbeddingModel, OnnxModelSettings};

use crate::config::{Backend, ServiceConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Given text, return a fixed-length vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Encodes one text into a vector of exactly `dimension()` values
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;

    /// Short backend identifier ("onnx", "hash")
    fn backend(&self) -> &'static str;

    /// Tokenizer window, if the backend has one
    fn max_tokens(&self) -> Option<usize> {
        None
    }
}

/// Loads the configured backend
///
/// Any error here is fatal: the caller must not start serving traffic.
pub async fn load_provider(config: &ServiceConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let start = Instant::now();

    let provider: Arc<dyn EmbeddingProvider> = match config.backend {
        Backend::Onnx => {
            let settings = config.onnx_settings();
            info!(
                model = %settings.model_name,
                model_path = %settings.model_path.display(),
                tokenizer_path = %settings.tokenizer_path.display(),
                "Loading ONNX embedding model"
            );

            let model = tokio::task::spawn_blocking(move || OnnxEmbeddingModel::load(&settings))
                .await
                .context("Model loading task panicked")??;
            Arc::new(model)
        }
        Backend::Hash => {
            warn!("Using hash embedding backend: vectors carry no semantic meaning");
            let model_name = config
                .model_name
                .clone()
                .unwrap_or_else(|| HASH_MODEL_NAME.to_string());
            Arc::new(HashEmbeddingProvider::with_name(model_name, config.dimension)?)
        }
    };

    info!(
        model = provider.model_name(),
        backend = provider.backend(),
        dimension = provider.dimension(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Embedding provider ready"
    );

    Ok(provider)
}
