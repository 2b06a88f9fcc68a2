// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::api::embed::embed_handler;
use crate::api::handlers::{health_handler, info_handler, not_found_handler};
use crate::config::DEFAULT_MAX_BODY_BYTES;
use crate::embeddings::EmbeddingProvider;
use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Request},
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Span};

/// Shared request context
///
/// The provider is loaded once before the listener binds and is never
/// replaced afterwards.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn EmbeddingProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }
}

pub fn create_app(state: AppState) -> Router {
    create_app_with_body_limit(state, DEFAULT_MAX_BODY_BYTES)
}

pub fn create_app_with_body_limit(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/embed", post(embed_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Request span without the query string, which may carry input text
fn make_request_span(request: &Request) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

/// Binds and serves until Ctrl-C
pub async fn start_server(addr: SocketAddr, state: AppState, max_body_bytes: usize) -> Result<()> {
    let app = create_app_with_body_limit(state, max_body_bytes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Embeddings service listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Embeddings service stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            // Keep serving; the process can still be killed
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
