// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Hash-based embedding provider
//!
//! Produces deterministic pseudo-random unit vectors seeded from a hash of
//! the input text. The vectors carry no semantics; this backend exists so
//! the service can be smoke-tested in environments without model files.

use crate::embeddings::pooling::l2_normalize;
use crate::embeddings::{EmbeddingError, EmbeddingProvider};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const HASH_MODEL_NAME: &str = "hash-embedding";

#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    model_name: String,
    dimension: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimension: usize) -> Result<Self> {
        Self::with_name(HASH_MODEL_NAME, dimension)
    }

    pub fn with_name(model_name: impl Into<String>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(anyhow!("Embedding dimension must be greater than 0"));
        }

        Ok(Self {
            model_name: model_name.into(),
            dimension,
        })
    }

    pub fn generate(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut current_seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            // Linear congruential step, mixed with the position
            current_seed =
                (current_seed.wrapping_mul(1664525).wrapping_add(1013904223)) ^ (i as u64);

            // Map to [-1, 1]
            let value = (current_seed as f64 / u64::MAX as f64) * 2.0 - 1.0;
            embedding.push(value as f32);
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.generate(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn backend(&self) -> &'static str {
        "hash"
    }
}
