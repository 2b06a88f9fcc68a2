// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! This module provides a wrapper around ONNX Runtime for running
//! the all-MiniLM-L6-v2 sentence transformer model.
//!
//! Features:
//! - ONNX model loading from disk, validated by a warm-up inference
//! - Optional CUDA acceleration (with automatic CPU fallback)
//! - BERT tokenization with an explicit truncation policy
//! - Mean pooling over token embeddings, then L2 normalization
//! - 384-dimensional output vectors

use crate::config::TruncationPolicy;
use crate::embeddings::pooling::{ensure_finite, l2_normalize, pool_output};
use crate::embeddings::{EmbeddingError, EmbeddingProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
#[cfg(feature = "cuda")]
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

/// Text used for the load-time warm-up inference
const WARMUP_TEXT: &str = "validation test";

/// Everything needed to load an ONNX sentence-embedding model
#[derive(Debug, Clone)]
pub struct OnnxModelSettings {
    /// Model name reported to clients (e.g., "all-MiniLM-L6-v2")
    pub model_name: String,
    /// Path to ONNX model file (model.onnx)
    pub model_path: PathBuf,
    /// Path to tokenizer JSON file (tokenizer.json)
    pub tokenizer_path: PathBuf,
    /// Output dimension the model must produce (384 for all-MiniLM-L6-v2)
    pub expected_dimension: usize,
    /// Tokenizer window, special tokens included
    pub max_tokens: usize,
    /// What to do with inputs longer than `max_tokens`
    pub truncation: TruncationPolicy,
    /// Apply L2 normalization after pooling
    pub normalize: bool,
    /// ONNX Runtime intra-op thread count
    pub intra_threads: usize,
    /// Try the CUDA execution provider before CPU
    pub use_cuda: bool,
}

/// ONNX-based embedding model (all-MiniLM-L6-v2)
///
/// # Model Details
/// - Input: Text strings (up to `max_tokens` tokens)
/// - Output: 384-dimensional f32 vectors
///
/// # Thread Safety
/// The ONNX session is not assumed to be reentrant, so every inference
/// takes the session mutex. Inference runs on tokio's blocking pool.
/// All fields are cheap to clone.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
    max_tokens: usize,
    truncation: TruncationPolicy,
    normalize: bool,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_tokens", &self.max_tokens)
            .field("truncation", &self.truncation)
            .field("normalize", &self.normalize)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the model and tokenizer from disk
    ///
    /// This is blocking and slow; call it from `spawn_blocking` when a
    /// runtime is already running.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - The warm-up inference fails
    /// - Model doesn't output `expected_dimension` values
    pub fn load(settings: &OnnxModelSettings) -> Result<Self> {
        let model_path = settings.model_path.as_path();
        let tokenizer_path = settings.tokenizer_path.as_path();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }
        if settings.max_tokens == 0 {
            anyhow::bail!("max_tokens must be greater than 0");
        }

        let session = build_session(model_path, settings.intra_threads, settings.use_cuda)?;
        info!(model = %model_path.display(), "ONNX session created");

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: settings.max_tokens,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure tokenizer truncation: {}", e))?;
        info!(tokenizer = %tokenizer_path.display(), "Tokenizer loaded");

        let model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name: settings.model_name.clone(),
            dimension: settings.expected_dimension,
            max_tokens: settings.max_tokens,
            truncation: settings.truncation,
            normalize: settings.normalize,
        };

        // Learn the real output width instead of trusting the configuration
        let probe = model
            .run_inference(WARMUP_TEXT)
            .context("Warm-up inference failed")?;
        if probe.len() != settings.expected_dimension {
            anyhow::bail!(
                "Model outputs unexpected dimensions: {} (expected {})",
                probe.len(),
                settings.expected_dimension
            );
        }

        Ok(model)
    }

    /// Synchronous encode: tokenize, run, pool, normalize, validate
    pub fn encode_blocking(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embedding = self.run_inference(text)?;

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        if self.normalize {
            l2_normalize(&mut embedding);
        }
        ensure_finite(&embedding)?;

        Ok(embedding)
    }

    fn run_inference(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;

        if !encoding.get_overflowing().is_empty() {
            match self.truncation {
                TruncationPolicy::Reject => {
                    return Err(EmbeddingError::InputTooLong {
                        max_tokens: self.max_tokens,
                    })
                }
                TruncationPolicy::Truncate => {
                    debug!(max_tokens = self.max_tokens, "Input truncated to model window");
                }
            }
        }

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();
        let seq_len = input_ids.len();

        let input_ids_value = Value::from_array(
            Array2::from_shape_vec((1, seq_len), input_ids).map_err(inference_error)?,
        )
        .map_err(inference_error)?;
        let attention_mask_value = Value::from_array(
            Array2::from_shape_vec((1, seq_len), attention_mask.clone())
                .map_err(inference_error)?,
        )
        .map_err(inference_error)?;
        let token_type_ids_value = Value::from_array(
            Array2::from_shape_vec((1, seq_len), token_type_ids).map_err(inference_error)?,
        )
        .map_err(inference_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::Unavailable("ONNX session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => attention_mask_value,
                "token_type_ids" => token_type_ids_value
            ])
            .map_err(inference_error)?;

        // Use index [0] instead of name since exports differ in output naming
        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(inference_error)?;

        let pooled = pool_output(output, &attention_mask)?;
        Ok(pooled)
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbeddingModel {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = self.clone();
        let text = text.to_owned();

        tokio::task::spawn_blocking(move || model.encode_blocking(&text))
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("Inference task failed: {}", e)))?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }

    fn max_tokens(&self) -> Option<usize> {
        Some(self.max_tokens)
    }
}

fn inference_error(e: impl std::fmt::Display) -> EmbeddingError {
    EmbeddingError::Inference(e.to_string())
}

fn build_session(model_path: &Path, intra_threads: usize, use_cuda: bool) -> Result<Session> {
    #[cfg(feature = "cuda")]
    if use_cuda {
        info!("Attempting CUDA execution provider...");
        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path);

        match cuda_result {
            Ok(session) => {
                info!("CUDA execution provider initialized");
                return Ok(session);
            }
            Err(e) => {
                warn!("CUDA execution provider failed: {}", e);
                warn!("Falling back to CPU execution provider");
            }
        }
    }

    #[cfg(not(feature = "cuda"))]
    if use_cuda {
        warn!("CUDA requested but this build lacks the `cuda` feature, using CPU");
    }

    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!(
            "Failed to load ONNX model from {}",
            model_path.display()
        ))
}
