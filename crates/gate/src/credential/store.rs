// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable credential store shared between the page process and the gateway.
//!
//! The JSON state file is the only channel between the two execution
//! contexts, so every operation is one load→mutate→save round trip under an
//! internal mutex; there is no in-memory cache to go stale when the other
//! side writes. Reads fail closed: if the file cannot be read, attachment
//! checks see no token and suppression checks report suppressed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::credential::persist::{self, StateMap};
use crate::credential::{
    epoch_ms, AUTH_TOKEN_KEY, LOGOUT_FLAG_KEY, LOGOUT_TIMESTAMP_KEY, REFRESH_TOKEN_KEY,
};

pub struct CredentialStore {
    path: PathBuf,
    max_logout_age: Duration,
    /// Serializes read-modify-write cycles within this process. Cross-process
    /// writers are per-key owners (see persist.rs), so last-writer-wins.
    lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(dir: &Path, max_logout_age: Duration) -> Self {
        Self { path: dir.join("auth_state.json"), max_logout_age, lock: Mutex::new(()) }
    }

    /// Read a single value. Storage errors degrade to "absent".
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let _guard = self.lock.lock().await;
        match persist::load(&self.path) {
            Ok(state) => state.get(key).cloned(),
            Err(e) => {
                tracing::warn!(key, err = %e, "credential store unreadable, treating as absent");
                None
            }
        }
    }

    /// Write a single value.
    pub async fn set(&self, key: &str, value: serde_json::Value) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut state = persist::load(&self.path)?;
        state.insert(key.to_owned(), value);
        persist::save(&self.path, &state)
    }

    /// Delete a single value.
    pub async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut state = persist::load(&self.path)?;
        state.remove(key);
        persist::save(&self.path, &state)
    }

    /// The stored access token, if any. Fails closed to `None`.
    pub async fn access_token(&self) -> Option<String> {
        self.get(AUTH_TOKEN_KEY).await.and_then(|v| v.as_str().map(str::to_owned))
    }

    /// The stored refresh token, if any. Fails closed to `None`.
    pub async fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY).await.and_then(|v| v.as_str().map(str::to_owned))
    }

    pub async fn set_access_token(&self, token: &str) -> anyhow::Result<()> {
        self.set(AUTH_TOKEN_KEY, serde_json::Value::String(token.to_owned())).await
    }

    /// Store a full token pair in one write.
    pub async fn set_tokens(&self, access: &str, refresh: Option<&str>) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut state = persist::load(&self.path)?;
        state.insert(AUTH_TOKEN_KEY.to_owned(), serde_json::Value::String(access.to_owned()));
        if let Some(refresh) = refresh {
            state
                .insert(REFRESH_TOKEN_KEY.to_owned(), serde_json::Value::String(refresh.to_owned()));
        }
        persist::save(&self.path, &state)
    }

    /// Remove both tokens in one write.
    pub async fn clear_tokens(&self) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut state = persist::load(&self.path)?;
        state.remove(AUTH_TOKEN_KEY);
        state.remove(REFRESH_TOKEN_KEY);
        persist::save(&self.path, &state)
    }

    /// Atomically set `auth_cleared = true` and the logout timestamp.
    pub async fn set_logout_signal(&self, timestamp_ms: u64) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut state = persist::load(&self.path)?;
        state.insert(LOGOUT_FLAG_KEY.to_owned(), serde_json::Value::Bool(true));
        state.insert(LOGOUT_TIMESTAMP_KEY.to_owned(), serde_json::Value::from(timestamp_ms));
        persist::save(&self.path, &state)
    }

    /// Whether the post-logout suppression window is active.
    ///
    /// True while `auth_cleared` is set and the logout is younger than
    /// `max_logout_age`; the window lapses on its own after that, with no
    /// explicit re-enable. An unreadable store reports suppressed.
    pub async fn is_in_suppression_window(&self) -> bool {
        let _guard = self.lock.lock().await;
        let state = match persist::load(&self.path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(err = %e, "credential store unreadable, suppressing credentials");
                return true;
            }
        };
        suppression_active(&state, self.max_logout_age, epoch_ms())
    }
}

/// Pure suppression predicate over a loaded state map.
fn suppression_active(state: &StateMap, max_logout_age: Duration, now_ms: u64) -> bool {
    let cleared = state.get(LOGOUT_FLAG_KEY).and_then(|v| v.as_bool()).unwrap_or(false);
    if !cleared {
        return false;
    }
    let timestamp = state.get(LOGOUT_TIMESTAMP_KEY).and_then(|v| v.as_u64()).unwrap_or(0);
    now_ms.saturating_sub(timestamp) < max_logout_age.as_millis() as u64
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
