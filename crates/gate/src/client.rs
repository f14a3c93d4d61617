// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Page-side HTTP client for the board API.
//!
//! Applies the interception policy to every request it sends and wraps the
//! whole thing in 401→refresh→retry-once: an expired token costs the caller
//! one transparent round trip, a dead session surfaces as
//! [`GateError::RefreshFailed`](crate::error::GateError).

use std::sync::Arc;

use reqwest::Client;

use crate::credential::refresh::TokenRefresher;
use crate::intercept::bypass;
use crate::intercept::policy::{Decision, RequestPolicy};

pub struct ApiClient {
    base_url: String,
    http: Client,
    policy: RequestPolicy,
    refresher: Arc<TokenRefresher>,
}

impl ApiClient {
    pub fn new(base_url: String, policy: RequestPolicy, refresher: Arc<TokenRefresher>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { base_url: base_url.trim_end_matches('/').to_owned(), http: client, policy, refresher }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json(&self, path: &str) -> anyhow::Result<serde_json::Value> {
        self.execute(reqwest::Method::GET, path, None).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        self.execute(reqwest::Method::POST, path, Some(body)).await
    }

    pub async fn patch_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        self.execute(reqwest::Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<serde_json::Value> {
        self.execute(reqwest::Method::DELETE, path, None).await
    }

    async fn execute(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> anyhow::Result<serde_json::Value> {
        let resp = self.send_with_policy(method.clone(), path, body).await?;

        // One refresh-and-retry on 401, never for bypass paths (a 401 from
        // the login endpoint is a real answer, not a stale token).
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED && !bypass::is_bypass_path(path) {
            tracing::debug!(path, "unauthorized response, refreshing token and retrying");
            self.refresher.refresh().await?;
            let resp = self.send_with_policy(method, path, body).await?;
            return read_json(resp).await;
        }

        read_json(resp).await
    }

    async fn send_with_policy(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> anyhow::Result<reqwest::Response> {
        let mut req = self.http.request(method, self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        match self.policy.decide(path, false).await {
            Decision::Attach(token) => req = req.bearer_auth(token),
            Decision::Strip | Decision::PassThrough => {}
        }
        Ok(req.send().await?)
    }
}

async fn read_json(resp: reqwest::Response) -> anyhow::Result<serde_json::Value> {
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("request failed ({status}): {text}");
    }
    let bytes = resp.bytes().await?;
    if bytes.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
