// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateError {
    /// Refresh token missing, expired, or rejected; the session is over.
    RefreshFailed,
    /// Credential storage could not be read or written.
    StorageUnavailable,
    /// A request URL could not be parsed during bypass matching.
    MalformedBypassUrl,
    /// The channel server rejected the token on close.
    ChannelAuthRejected,
    /// The channel gave up after the configured retry budget.
    ChannelRetriesExhausted,
    UpstreamError,
    BadRequest,
}

impl GateError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::RefreshFailed | Self::ChannelAuthRejected => 401,
            Self::StorageUnavailable => 503,
            Self::MalformedBypassUrl | Self::BadRequest => 400,
            Self::ChannelRetriesExhausted => 504,
            Self::UpstreamError => 502,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RefreshFailed => "REFRESH_FAILED",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::MalformedBypassUrl => "MALFORMED_BYPASS_URL",
            Self::ChannelAuthRejected => "CHANNEL_AUTH_REJECTED",
            Self::ChannelRetriesExhausted => "CHANNEL_RETRIES_EXHAUSTED",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::BadRequest => "BAD_REQUEST",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for GateError {}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
