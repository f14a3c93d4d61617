// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JWT claim inspection for proactive refresh decisions.
//!
//! The gateway never verifies signatures; it only reads the `exp` claim to
//! decide whether a token is worth sending. Verification is the server's job.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::credential::epoch_secs;

/// Extract the `exp` claim (epoch seconds) from an unverified JWT.
pub fn token_expiry(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    // Some encoders pad the segment; the claim set is the same either way.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_u64()
}

/// Whether the token expires within `threshold` from now.
///
/// A token with no readable `exp` counts as expiring: the server always
/// mints one, so an unreadable claim is not worth holding on to.
pub fn expires_within(token: &str, threshold: Duration) -> bool {
    match token_expiry(token) {
        Some(exp) => exp <= epoch_secs().saturating_add(threshold.as_secs()),
        None => true,
    }
}

#[cfg(test)]
#[path = "claims_tests.rs"]
mod tests;
