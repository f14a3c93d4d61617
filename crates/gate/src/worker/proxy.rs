// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The intercepting forwarder.
//!
//! Rebuilds each page request toward the API base with the policy decision
//! applied, preserving method, body, and unrelated headers. If the rebuild
//! fails, the original request is forwarded untouched.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::error::GateError;
use crate::intercept::policy::Decision;
use crate::state::{GateState, WorkerPhase};

/// Headers never copied when forwarding in either direction.
const HOP_BY_HOP: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Headers scrubbed when the decision is [`Decision::Strip`].
const CREDENTIAL_HEADERS: &[&str] = &["authorization", "x-csrftoken"];

/// Fallback handler: intercept, decide, forward.
pub async fn forward(State(s): State<Arc<GateState>>, req: Request) -> Response {
    if s.phase() != WorkerPhase::Active {
        return GateError::UpstreamError.to_http_response("worker not active").into_response();
    }

    let (parts, body) = req.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return GateError::BadRequest
                .to_http_response(format!("unreadable request body: {e}"))
                .into_response();
        }
    };

    let path_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let has_authorization = parts.headers.contains_key(axum::http::header::AUTHORIZATION);
    let decision = s.policy.decide(path_query, has_authorization).await;

    let target = format!("{}{}", s.config.api_base.trim_end_matches('/'), path_query);

    let outgoing =
        match build_forward(&s.http, &parts.method, &target, &parts.headers, &body, &decision) {
            Ok(req) => Some(req),
            Err(e) => {
                tracing::warn!(path = path_query, err = %e, "request rebuild failed, forwarding original");
                build_forward(
                    &s.http,
                    &parts.method,
                    &target,
                    &parts.headers,
                    &body,
                    &Decision::PassThrough,
                )
                .ok()
            }
        };

    let Some(outgoing) = outgoing else {
        return GateError::UpstreamError
            .to_http_response("request could not be forwarded")
            .into_response();
    };

    match outgoing.send().await {
        Ok(resp) => relay_response(resp).await,
        Err(e) => {
            tracing::warn!(path = path_query, err = %e, "upstream request failed");
            GateError::UpstreamError.to_http_response(format!("upstream unreachable: {e}"))
                .into_response()
        }
    }
}

/// Build the outgoing reqwest request with the decision applied.
fn build_forward(
    http: &reqwest::Client,
    method: &Method,
    url: &str,
    headers: &HeaderMap,
    body: &Bytes,
    decision: &Decision,
) -> anyhow::Result<reqwest::RequestBuilder> {
    let method = reqwest::Method::from_bytes(method.as_str().as_bytes())?;

    let mut forwarded = reqwest::header::HeaderMap::new();
    for (name, value) in headers {
        let lower = name.as_str().to_ascii_lowercase();
        if HOP_BY_HOP.contains(&lower.as_str()) {
            continue;
        }
        if matches!(decision, Decision::Strip) && CREDENTIAL_HEADERS.contains(&lower.as_str()) {
            continue;
        }
        let name = reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes())?;
        let value = reqwest::header::HeaderValue::from_bytes(value.as_bytes())?;
        forwarded.append(name, value);
    }

    if let Decision::Attach(token) = decision {
        forwarded.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
    }

    Ok(http.request(method, url).headers(forwarded).body(body.clone()))
}

/// Relay the upstream response back to the page verbatim.
async fn relay_response(resp: reqwest::Response) -> Response {
    let status =
        StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    for (name, value) in resp.headers() {
        let lower = name.as_str().to_ascii_lowercase();
        if HOP_BY_HOP.contains(&lower.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            axum::http::HeaderName::from_bytes(name.as_str().as_bytes()),
            axum::http::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }

    let body = match resp.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(err = %e, "failed to read upstream response body");
            return GateError::UpstreamError
                .to_http_response(format!("upstream body unreadable: {e}"))
                .into_response();
        }
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
