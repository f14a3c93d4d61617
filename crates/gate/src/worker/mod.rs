// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The background proxy worker: an axum server every page-context request
//! flows through. Control traffic lives under `/gate/`; everything else is
//! intercepted, rewritten per policy, and forwarded to the API.

pub mod http;
pub mod messages;
pub mod proxy;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::GateState;

/// Build the axum `Router` for the gateway.
pub fn build_router(state: Arc<GateState>) -> Router {
    Router::new()
        .route("/gate/health", get(http::health))
        .route("/gate/message", post(http::message))
        // Everything else is page traffic to intercept and forward.
        .fallback(proxy::forward)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
