// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn set_auth_token_wire_format() {
    let msg: WorkerMessage =
        serde_json::from_str(r#"{"type":"SET_AUTH_TOKEN","token":"tok-1"}"#).expect("parse");
    match msg {
        WorkerMessage::SetAuthToken { token } => assert_eq!(token, "tok-1"),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[test]
fn clear_auth_token_wire_format() {
    let msg: WorkerMessage =
        serde_json::from_str(r#"{"type":"CLEAR_AUTH_TOKEN"}"#).expect("parse");
    assert!(matches!(msg, WorkerMessage::ClearAuthToken));
}

#[test]
fn logout_with_timestamp() {
    let msg: WorkerMessage =
        serde_json::from_str(r#"{"type":"LOGOUT","timestamp":1700000000000}"#).expect("parse");
    match msg {
        WorkerMessage::Logout { timestamp } => assert_eq!(timestamp, Some(1_700_000_000_000)),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[test]
fn logout_timestamp_is_optional() {
    let msg: WorkerMessage = serde_json::from_str(r#"{"type":"LOGOUT"}"#).expect("parse");
    assert!(matches!(msg, WorkerMessage::Logout { timestamp: None }));
}

#[test]
fn ack_omits_absent_fields() {
    let json = serde_json::to_value(MessageAck::ok()).expect("serialize");
    assert_eq!(json, serde_json::json!({"success": true}));

    let json = serde_json::to_value(MessageAck::ok_at(123)).expect("serialize");
    assert_eq!(json, serde_json::json!({"success": true, "timestamp": 123}));

    let json = serde_json::to_value(MessageAck::failed("storage down")).expect("serialize");
    assert_eq!(json, serde_json::json!({"success": false, "error": "storage down"}));
}
