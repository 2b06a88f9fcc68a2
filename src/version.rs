// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the embeddings service

/// Semantic version number
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service identity reported by `/health` and `/info`
pub const SERVICE_NAME: &str = "embeddings";

/// Returns a human-readable version string for startup logs
pub fn version_string() -> String {
    format!("{} v{}", env!("CARGO_PKG_NAME"), VERSION)
}
