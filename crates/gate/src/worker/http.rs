// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control handlers for the gateway.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::credential::{epoch_ms, AUTH_TOKEN_KEY};
use crate::error::GateError;
use crate::state::GateState;
use crate::worker::messages::{MessageAck, WorkerMessage};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub phase: String,
    pub suppressed: bool,
}

/// `GET /gate/health`
pub async fn health(State(s): State<Arc<GateState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        phase: s.phase().as_str().to_owned(),
        suppressed: s.store.is_in_suppression_window().await,
    })
}

/// `POST /gate/message` — page→worker control channel.
///
/// LOGOUT persists the suppression signal before the reply is sent, so any
/// request issued after the ack observes it.
pub async fn message(
    State(s): State<Arc<GateState>>,
    Json(msg): Json<WorkerMessage>,
) -> impl IntoResponse {
    match msg {
        WorkerMessage::SetAuthToken { token } => {
            match s.store.set_access_token(&token).await {
                Ok(()) => {
                    tracing::debug!("auth token stored");
                    (StatusCode::OK, Json(MessageAck::ok()))
                }
                Err(e) => {
                    tracing::warn!(err = %e, "failed to store auth token");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(MessageAck::failed(format!("{}: {e}", GateError::StorageUnavailable))),
                    )
                }
            }
        }
        WorkerMessage::ClearAuthToken => match s.store.delete(AUTH_TOKEN_KEY).await {
            Ok(()) => {
                tracing::debug!("auth token cleared");
                (StatusCode::OK, Json(MessageAck::ok()))
            }
            Err(e) => {
                tracing::warn!(err = %e, "failed to clear auth token");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(MessageAck::failed(format!("{}: {e}", GateError::StorageUnavailable))),
                )
            }
        },
        WorkerMessage::Logout { timestamp } => {
            let timestamp = timestamp.unwrap_or_else(epoch_ms);
            match s.store.set_logout_signal(timestamp).await {
                Ok(()) => {
                    tracing::info!(timestamp, "logout signal set");
                    (StatusCode::OK, Json(MessageAck::ok_at(timestamp)))
                }
                Err(e) => {
                    tracing::warn!(err = %e, "failed to set logout signal");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(MessageAck::failed(format!("{}: {e}", GateError::StorageUnavailable))),
                    )
                }
            }
        }
    }
}
