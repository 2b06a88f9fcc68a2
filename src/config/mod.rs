// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Service configuration
//!
//! Every option is a command-line flag with an environment variable
//! fallback. `main` loads a `.env` file before parsing.

use crate::embeddings::OnnxModelSettings;
use anyhow::{bail, Result};
use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default model: all-MiniLM-L6-v2 (384 dimensions)
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_MODEL_DIR: &str = "./models/all-MiniLM-L6-v2-onnx";
pub const DEFAULT_DIMENSION: usize = 384;
/// all-MiniLM-L6-v2 was trained with a 256 token window
pub const DEFAULT_MAX_TOKENS: usize = 256;
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Embedding backend selected at deploy time
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// all-MiniLM-L6-v2 through ONNX Runtime
    Onnx,
    /// Deterministic hash vectors, for smoke tests without model files
    Hash,
}

/// Policy for inputs longer than the tokenizer window
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Keep the first `max_tokens` tokens
    Truncate,
    /// Fail the request with a client error
    Reject,
}

/// Embeddings service configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "embeddings-service")]
#[command(version)]
#[command(about = "HTTP service exposing a sentence-embedding model", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind
    #[arg(long, env = "EMBEDDINGS_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to bind
    #[arg(long, env = "EMBEDDINGS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Embedding backend
    #[arg(long, env = "EMBEDDINGS_BACKEND", value_enum, default_value_t = Backend::Onnx)]
    pub backend: Backend,

    /// Model name reported to clients (defaults to the backend's own name)
    #[arg(long, env = "EMBEDDINGS_MODEL_NAME")]
    pub model_name: Option<String>,

    /// Directory holding model.onnx and tokenizer.json
    #[arg(long, env = "EMBEDDINGS_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// ONNX model file (overrides <model-dir>/model.onnx)
    #[arg(long, env = "EMBEDDINGS_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Tokenizer file (overrides <model-dir>/tokenizer.json)
    #[arg(long, env = "EMBEDDINGS_TOKENIZER_PATH")]
    pub tokenizer_path: Option<PathBuf>,

    /// Expected embedding dimension
    #[arg(long, env = "EMBEDDINGS_DIMENSION", default_value_t = DEFAULT_DIMENSION)]
    pub dimension: usize,

    /// Tokenizer window, special tokens included
    #[arg(long, env = "EMBEDDINGS_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: usize,

    /// What to do with inputs longer than --max-tokens
    #[arg(long, env = "EMBEDDINGS_TRUNCATION", value_enum, default_value_t = TruncationPolicy::Truncate)]
    pub truncation: TruncationPolicy,

    /// L2-normalize embeddings
    #[arg(long, env = "EMBEDDINGS_NORMALIZE", default_value_t = true, action = ArgAction::Set)]
    pub normalize: bool,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "EMBEDDINGS_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Try the CUDA execution provider first
    #[arg(long, env = "EMBEDDINGS_USE_CUDA", default_value_t = false, action = ArgAction::Set)]
    pub use_cuda: bool,

    /// Maximum request body size in bytes
    #[arg(long, env = "EMBEDDINGS_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl ServiceConfig {
    /// Rejects values that would only fail later, after startup work
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            bail!("dimension must be greater than 0");
        }
        if self.max_tokens == 0 {
            bail!("max_tokens must be greater than 0");
        }
        if self.intra_threads == 0 {
            bail!("intra_threads must be greater than 0");
        }
        if self.max_body_bytes == 0 {
            bail!("max_body_bytes must be greater than 0");
        }
        if matches!(&self.model_name, Some(name) if name.trim().is_empty()) {
            bail!("model_name cannot be empty");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn model_file(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| self.model_dir.join("model.onnx"))
    }

    pub fn tokenizer_file(&self) -> PathBuf {
        self.tokenizer_path
            .clone()
            .unwrap_or_else(|| self.model_dir.join("tokenizer.json"))
    }

    pub fn onnx_settings(&self) -> OnnxModelSettings {
        OnnxModelSettings {
            model_name: self
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            model_path: self.model_file(),
            tokenizer_path: self.tokenizer_file(),
            expected_dimension: self.dimension,
            max_tokens: self.max_tokens,
            truncation: self.truncation,
            normalize: self.normalize,
            intra_threads: self.intra_threads,
            use_cuda: self.use_cuda,
        }
    }
}
