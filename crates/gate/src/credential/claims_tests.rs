// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::*;

fn make_token(exp: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"user_id":"u1","exp":{exp}}}"#));
    format!("{header}.{payload}.signature")
}

#[test]
fn token_expiry_reads_exp_claim() {
    let token = make_token(1_999_999_999);
    assert_eq!(token_expiry(&token), Some(1_999_999_999));
}

#[test]
fn token_expiry_tolerates_padded_segments() {
    let token = make_token(1_999_999_999);
    let padded = format!("{token}==");
    // Padding lands on the signature segment; the payload is what matters.
    assert_eq!(token_expiry(&padded), Some(1_999_999_999));

    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#);
    let payload = format!("{}==", URL_SAFE_NO_PAD.encode(r#"{"exp":42}"#));
    assert_eq!(token_expiry(&format!("{header}.{payload}.sig")), Some(42));
}

#[test]
fn token_expiry_rejects_garbage() {
    assert_eq!(token_expiry("not-a-token"), None);
    assert_eq!(token_expiry("a.!!!.c"), None);
    assert_eq!(token_expiry(""), None);
}

#[test]
fn token_expiry_missing_claim() {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#);
    let payload = URL_SAFE_NO_PAD.encode(r#"{"user_id":"u1"}"#);
    assert_eq!(token_expiry(&format!("{header}.{payload}.sig")), None);
}

#[test]
fn fresh_token_is_not_expiring() {
    // exp ten minutes out, five-minute threshold.
    let token = make_token(epoch_secs() + 600);
    assert!(!expires_within(&token, Duration::from_secs(300)));
}

#[test]
fn near_expiry_token_is_expiring() {
    // exp two minutes out, five-minute threshold.
    let token = make_token(epoch_secs() + 120);
    assert!(expires_within(&token, Duration::from_secs(300)));
}

#[test]
fn unreadable_token_counts_as_expiring() {
    assert!(expires_within("garbage", Duration::from_secs(300)));
}
