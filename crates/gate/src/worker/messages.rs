// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control messages from the page context.
//!
//! The tag values are part of the page↔worker wire contract and predate this
//! implementation, hence the SCREAMING_CASE renames.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    /// Cache this access token for ATTACH decisions.
    #[serde(rename = "SET_AUTH_TOKEN")]
    SetAuthToken { token: String },
    /// Drop the cached access token.
    #[serde(rename = "CLEAR_AUTH_TOKEN")]
    ClearAuthToken,
    /// The page logged out; persist the suppression signal before replying.
    #[serde(rename = "LOGOUT")]
    Logout {
        #[serde(default)]
        timestamp: Option<u64>,
    },
}

/// Reply to a control message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageAck {
    pub fn ok() -> Self {
        Self { success: true, timestamp: None, error: None }
    }

    pub fn ok_at(timestamp: u64) -> Self {
        Self { success: true, timestamp: Some(timestamp), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, timestamp: None, error: Some(error.into()) }
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
