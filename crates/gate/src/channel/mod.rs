// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live collaboration channels: token-aware reconnecting WebSockets.

pub mod envelope;
pub mod socket;

/// `<ws_base>/ws/boards/{id}/` — kanban board events.
pub fn board_channel_url(ws_base: &str, board_id: &str) -> String {
    format!("{}/ws/boards/{board_id}/", ws_base.trim_end_matches('/'))
}

/// `<ws_base>/ws/projects/{id}/` — project-level events.
pub fn project_channel_url(ws_base: &str, project_id: &str) -> String {
    format!("{}/ws/projects/{project_id}/", ws_base.trim_end_matches('/'))
}

/// `<ws_base>/ws/notifications/` — per-user notification stream.
pub fn notification_channel_url(ws_base: &str) -> String {
    format!("{}/ws/notifications/", ws_base.trim_end_matches('/'))
}
