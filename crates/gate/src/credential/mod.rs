// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential lifecycle: the durable auth-state store shared between the
//! page process and the gateway, JWT claim inspection, and token refresh.

use std::path::PathBuf;

pub mod claims;
pub mod persist;
pub mod refresh;
pub mod store;

/// Persisted state keys. The file layout is shared with every context that
/// opens the store, so these names are part of the on-disk contract.
pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const LOGOUT_FLAG_KEY: &str = "auth_cleared";
pub const LOGOUT_TIMESTAMP_KEY: &str = "logout_timestamp";

/// Backend endpoint for exchanging a refresh token.
pub const REFRESH_PATH: &str = "/api/v1/auth/jwt/refresh/";

/// Backend endpoint for obtaining the initial token pair.
pub const LOGIN_PATH: &str = "/api/v1/auth/jwt/create/";

/// Resolve the state directory for gateway data.
///
/// Checks `BOARDGATE_STATE_DIR`, then `$XDG_STATE_HOME/boardgate`,
/// then `$HOME/.local/state/boardgate`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BOARDGATE_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("boardgate");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/boardgate");
    }
    PathBuf::from(".boardgate")
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Return current epoch seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
