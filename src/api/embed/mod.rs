// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! This module provides the POST /embed endpoint for turning one text into
//! a fixed-length vector.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::embed_handler;
pub use request::{EmbedQuery, EmbedRequest};
pub use response::EmbedResponse;
