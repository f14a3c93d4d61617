// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boardgate: credential gateway for the board collaboration API.
//!
//! Guarantees that Authorization headers are attached to authenticated API
//! traffic, scrubbed during the post-logout suppression window, and kept
//! fresh on long-lived channel connections.

pub mod channel;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod intercept;
pub mod state;
pub mod worker;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::GateConfig;
use crate::state::GateState;
use crate::worker::build_router;

/// Run the gateway until shutdown.
pub async fn run(config: GateConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let state = Arc::new(GateState::new(config, shutdown.clone()));
    let router = build_router(Arc::clone(&state));

    let listener = TcpListener::bind(&addr).await?;
    // Claim all pages the moment the socket is live, not on next navigation.
    state.activate();
    tracing::info!("boardgate listening on {addr}");

    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
