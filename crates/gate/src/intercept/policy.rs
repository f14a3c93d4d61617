// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-request attach/strip policy.

use std::sync::Arc;

use crate::credential::store::CredentialStore;
use crate::error::GateError;
use crate::intercept::bypass::{self, BypassMatch};

/// What to do with one outgoing request's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Forward untouched.
    PassThrough,
    /// Remove Authorization (and CSRF) headers before forwarding.
    Strip,
    /// Set `Authorization: Bearer <token>`.
    Attach(String),
}

/// Decides, per request, whether to attach, strip, or leave credentials
/// alone. Holds no per-request state; safe to share.
#[derive(Clone)]
pub struct RequestPolicy {
    store: Arc<CredentialStore>,
}

impl RequestPolicy {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }

    /// Evaluate the policy for one request.
    ///
    /// The order is load-bearing: suppression dominates everything (a
    /// security control beats the attachment convenience), the bypass list
    /// beats attachment (identity endpoints must never see an injected
    /// credential), and a caller-set header is never overwritten.
    pub async fn decide(&self, url: &str, has_authorization: bool) -> Decision {
        if self.store.is_in_suppression_window().await {
            return Decision::Strip;
        }

        match bypass::check_url(url) {
            BypassMatch::Match => return Decision::PassThrough,
            BypassMatch::Malformed => {
                // A parsing bug must not inject a credential.
                tracing::debug!(url, code = %GateError::MalformedBypassUrl, "bypass check failed open");
                return Decision::PassThrough;
            }
            BypassMatch::NoMatch => {}
        }

        if has_authorization {
            return Decision::PassThrough;
        }

        match self.store.access_token().await {
            Some(token) => Decision::Attach(token),
            None => Decision::PassThrough,
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
