// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod embed;
pub mod errors;
pub mod handlers;
pub mod http_server;

pub use embed::{embed_handler, EmbedQuery, EmbedRequest, EmbedResponse};
pub use errors::{ApiError, ErrorResponse};
pub use handlers::{health_handler, info_handler, HealthResponse, InfoResponse};
pub use http_server::{create_app, create_app_with_body_limit, start_server, AppState};
