// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use embeddings_service::{
    api::{start_server, AppState},
    config::ServiceConfig,
    embeddings::load_provider,
    version,
};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let config = ServiceConfig::parse();
    config.validate().context("Invalid configuration")?;

    info!("Starting {}", version::version_string());
    info!(
        backend = ?config.backend,
        truncation = ?config.truncation,
        max_tokens = config.max_tokens,
        "Configuration loaded"
    );

    // The model must be ready before the listener binds
    let provider = load_provider(&config)
        .await
        .context("Failed to initialize embedding provider")?;

    start_server(
        config.bind_addr(),
        AppState::new(provider),
        config.max_body_bytes,
    )
    .await
}
