// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence pooling over transformer outputs
//!
//! all-MiniLM-L6-v2 exported to ONNX emits token-level embeddings
//! `[batch, seq_len, hidden_dim]`. The sentence vector is the mean of the
//! token vectors weighted by the attention mask, followed by L2 normalization.

use crate::embeddings::EmbeddingError;
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};

/// Reduces the first batch item of a model output to a sentence vector
///
/// Accepts token-level `[batch, seq_len, hidden]` output (mean pooled under
/// `attention_mask`) or already pooled `[batch, hidden]` output.
pub fn pool_output(
    output: ArrayViewD<'_, f32>,
    attention_mask: &[i64],
) -> Result<Vec<f32>, EmbeddingError> {
    match output.ndim() {
        3 => {
            let tokens = output
                .index_axis(Axis(0), 0)
                .into_dimensionality::<Ix2>()
                .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
            mean_pool(tokens, attention_mask)
        }
        2 => Ok(output.index_axis(Axis(0), 0).iter().copied().collect()),
        _ => Err(EmbeddingError::Inference(format!(
            "Model outputs unexpected shape: {:?} (expected [batch, seq_len, hidden] or [batch, hidden])",
            output.shape()
        ))),
    }
}

/// Mean pooling over `[seq_len, hidden_dim]`, ignoring masked positions
pub fn mean_pool(
    token_embeddings: ArrayView2<'_, f32>,
    attention_mask: &[i64],
) -> Result<Vec<f32>, EmbeddingError> {
    let (seq_len, hidden_dim) = token_embeddings.dim();
    if attention_mask.len() != seq_len {
        return Err(EmbeddingError::Inference(format!(
            "Attention mask length {} does not match sequence length {}",
            attention_mask.len(),
            seq_len
        )));
    }

    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for (row, &mask) in token_embeddings.outer_iter().zip(attention_mask) {
        let weight = mask as f32;
        if weight == 0.0 {
            continue;
        }
        sum_mask += weight;
        for (acc, value) in pooled.iter_mut().zip(row.iter()) {
            *acc += value * weight;
        }
    }

    // Avoid division by zero on an all-padding sequence
    let denom = sum_mask.max(1e-9);
    for value in &mut pooled {
        *value /= denom;
    }

    Ok(pooled)
}

/// Scales the vector to unit length in place; zero vectors are left untouched
pub fn l2_normalize(embedding: &mut [f32]) {
    let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in embedding.iter_mut() {
            *value /= norm;
        }
    }
}

/// Fails on the first NaN or infinite component
pub fn ensure_finite(embedding: &[f32]) -> Result<(), EmbeddingError> {
    match embedding.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(EmbeddingError::NonFinite { index }),
        None => Ok(()),
    }
}
