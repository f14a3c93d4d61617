// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight token refresh.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::credential::store::CredentialStore;
use crate::credential::{claims, epoch_ms, LOGIN_PATH, REFRESH_PATH};
use crate::error::GateError;

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Response from the refresh endpoint. Fixed shape; the gateway does not
/// sniff alternative layouts.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    /// Present when the server rotates refresh tokens.
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
}

/// Outcome slot for coalescing concurrent refresh attempts.
#[derive(Default)]
struct RefreshGate {
    /// Completed refresh generation.
    seq: u64,
    last: Option<Result<String, GateError>>,
}

/// Exchanges the stored refresh token for a new access token.
///
/// Concurrent callers within one in-flight window coalesce onto a single
/// network call and observe the same outcome. Any failure (missing refresh
/// token, timeout, rejection) ends the session: tokens are cleared, the
/// logout signal is set, and callers get [`GateError::RefreshFailed`].
pub struct TokenRefresher {
    store: Arc<CredentialStore>,
    http: reqwest::Client,
    refresh_url: String,
    login_url: String,
    gate: Mutex<RefreshGate>,
}

impl TokenRefresher {
    pub fn new(store: Arc<CredentialStore>, api_base: &str, timeout: Duration) -> Self {
        let base = api_base.trim_end_matches('/');
        Self {
            store,
            http: reqwest::Client::builder().timeout(timeout).build().unwrap_or_default(),
            refresh_url: format!("{base}{REFRESH_PATH}"),
            login_url: format!("{base}{LOGIN_PATH}"),
            gate: Mutex::new(RefreshGate::default()),
        }
    }

    /// Refresh the access token, coalescing with any refresh already in flight.
    pub async fn refresh(&self) -> Result<String, GateError> {
        let entered = self.gate.lock().await.seq;

        let mut gate = self.gate.lock().await;
        if gate.seq > entered {
            // A refresh completed while we queued; share its outcome.
            if let Some(outcome) = gate.last.clone() {
                return outcome;
            }
        }

        let outcome = self.do_refresh().await;
        gate.seq += 1;
        gate.last = Some(outcome.clone());
        outcome
    }

    /// Return the stored token if it stays valid for at least `threshold`,
    /// otherwise refresh. An absent or unreadable token refreshes too.
    pub async fn ensure_fresh(&self, threshold: Duration) -> Result<String, GateError> {
        if let Some(token) = self.store.access_token().await {
            if !claims::expires_within(&token, threshold) {
                return Ok(token);
            }
        }
        self.refresh().await
    }

    /// Obtain an initial token pair from credentials.
    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<()> {
        let resp =
            self.http.post(&self.login_url).json(&LoginRequest { email, password }).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("login failed ({status}): {text}");
        }
        let body: LoginResponse = resp.json().await?;
        self.store.set_tokens(&body.access, Some(&body.refresh)).await?;
        Ok(())
    }

    /// End the session: drop tokens and raise the logout signal.
    ///
    /// Returns the logout timestamp so the caller can forward it to the
    /// gateway's LOGOUT message.
    pub async fn logout(&self) -> anyhow::Result<u64> {
        let timestamp = epoch_ms();
        self.store.clear_tokens().await?;
        self.store.set_logout_signal(timestamp).await?;
        Ok(timestamp)
    }

    async fn do_refresh(&self) -> Result<String, GateError> {
        let Some(refresh_token) = self.store.refresh_token().await else {
            tracing::warn!("no refresh token stored, ending session");
            self.fail_session().await;
            return Err(GateError::RefreshFailed);
        };

        let result = self
            .http
            .post(&self.refresh_url)
            .json(&RefreshRequest { refresh: &refresh_token })
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                // Timeouts land here and are treated exactly like a rejection
                // to avoid an indefinitely half-authenticated state.
                tracing::warn!(err = %e, "token refresh request failed, ending session");
                self.fail_session().await;
                return Err(GateError::RefreshFailed);
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!(%status, "token refresh rejected, ending session");
            self.fail_session().await;
            return Err(GateError::RefreshFailed);
        }

        let body: RefreshResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(err = %e, "malformed refresh response, ending session");
                self.fail_session().await;
                return Err(GateError::RefreshFailed);
            }
        };

        if let Err(e) = self.store.set_tokens(&body.access, body.refresh.as_deref()).await {
            // The caller can still use the token; the next read fails closed.
            tracing::warn!(err = %e, "failed to persist refreshed token");
        }
        tracing::debug!("access token refreshed");
        Ok(body.access)
    }

    async fn fail_session(&self) {
        if let Err(e) = self.store.clear_tokens().await {
            tracing::warn!(err = %e, "failed to clear tokens after refresh failure");
        }
        if let Err(e) = self.store.set_logout_signal(epoch_ms()).await {
            tracing::warn!(err = %e, "failed to set logout signal after refresh failure");
        }
    }
}
