// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel wire messages.
//!
//! Messages use internally-tagged JSON enums (`{"type": "notification", ...}`)
//! matching the backend consumers. Unknown types deserialize to `Unknown`
//! rather than failing the whole connection.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    TaskCreateMessage {
        task: serde_json::Value,
        column_id: i64,
        user: serde_json::Value,
    },
    TaskMoveMessage {
        task_id: String,
        source_column_id: i64,
        destination_column_id: i64,
        order: i64,
        user: serde_json::Value,
    },
    CurrentViewers {
        viewers: Vec<serde_json::Value>,
    },
    UserJoined {
        user: serde_json::Value,
    },
    UserLeft {
        user: serde_json::Value,
    },
    Notification {
        notification: serde_json::Value,
    },
    Heartbeat {},
    #[serde(other)]
    Unknown,
}

/// The outbound keep-alive frame, `{"type":"heartbeat"}`.
pub fn heartbeat_frame() -> String {
    r#"{"type":"heartbeat"}"#.to_owned()
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
