// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoints that must never receive an auto-attached Authorization header.
//!
//! Injecting a credential into registration, login, or password-reset
//! traffic can flip those endpoints into an authenticated code path and
//! open an account-takeover hole, so membership here is checked before any
//! attachment logic runs. This list is the single authoritative copy,
//! versioned with the backend routing table.

/// Exact-or-prefix path patterns, ordered current API first.
pub const BYPASS_ENDPOINTS: &[&str] = &[
    // Account endpoints (versioned API)
    "/api/v1/auth/users/",
    "/api/v1/auth/users/activation/",
    "/api/v1/auth/users/resend_activation/",
    "/api/v1/auth/users/reset_password/",
    "/api/v1/auth/users/reset_password_confirm/",
    "/api/v1/auth/users/set_password/",
    "/api/v1/auth/users/set_username/",
    // JWT endpoints (versioned API)
    "/api/v1/auth/jwt/create/",
    "/api/v1/auth/jwt/refresh/",
    "/api/v1/auth/jwt/verify/",
    "/api/v1/auth/jwt/blacklist/",
    // Public endpoints
    "/api/v1/public/password-reset/",
    // Pre-versioning paths still served by the backend
    "/api/auth/users/",
    "/api/auth/jwt/create/",
    "/api/auth/jwt/refresh/",
    "/api/auth/token/refresh/",
    "/api/auth/password/reset/",
    "/api/login/",
    "/api/logout/",
    "/api/token/",
    "/api/refresh-token/",
];

/// Whether a request path matches the bypass list (exact or prefix).
pub fn is_bypass_path(path: &str) -> bool {
    BYPASS_ENDPOINTS.iter().any(|endpoint| path == *endpoint || path.starts_with(endpoint))
}

/// Result of matching a raw URL against the bypass list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassMatch {
    Match,
    NoMatch,
    /// The URL could not be parsed; the caller must not attach anything.
    Malformed,
}

/// Match a raw URL (absolute or `/`-rooted path) against the bypass list.
///
/// Never errors: a URL that parses as neither is reported as `Malformed`
/// so the policy can pass the request through untouched.
pub fn check_url(url: &str) -> BypassMatch {
    if url.starts_with('/') {
        // Already a bare path, as seen by the sidecar's fallback route.
        let path = url.split(['?', '#']).next().unwrap_or(url);
        return if is_bypass_path(path) { BypassMatch::Match } else { BypassMatch::NoMatch };
    }
    match reqwest::Url::parse(url) {
        Ok(parsed) => {
            if is_bypass_path(parsed.path()) {
                BypassMatch::Match
            } else {
                BypassMatch::NoMatch
            }
        }
        Err(e) => {
            tracing::debug!(url, err = %e, "unparseable URL in bypass check");
            BypassMatch::Malformed
        }
    }
}

#[cfg(test)]
#[path = "bypass_tests.rs"]
mod tests;
