// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the boardgate sidecar.
#[derive(Debug, Clone, clap::Args)]
pub struct GateConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "BOARDGATE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8787, env = "BOARDGATE_PORT")]
    pub port: u16,

    /// Base URL of the backend API (e.g. `http://localhost:8000`).
    #[arg(long, default_value = "http://127.0.0.1:8000", env = "BOARDGATE_API_BASE")]
    pub api_base: String,

    /// Base URL for WebSocket channels. Derived from `api_base` when unset.
    #[arg(long, env = "BOARDGATE_WS_BASE")]
    pub ws_base: Option<String>,

    /// Directory for the persisted credential state file.
    #[arg(long, env = "BOARDGATE_STATE_DIR")]
    pub state_dir: Option<std::path::PathBuf>,

    /// Post-logout suppression window in milliseconds.
    #[arg(long, default_value_t = 300_000, env = "BOARDGATE_MAX_LOGOUT_AGE_MS")]
    pub max_logout_age_ms: u64,

    /// Timeout for a token refresh request in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "BOARDGATE_REFRESH_TIMEOUT_MS")]
    pub refresh_timeout_ms: u64,

    /// Remaining-lifetime threshold below which tokens are refreshed proactively.
    #[arg(long, default_value_t = 300, env = "BOARDGATE_REFRESH_THRESHOLD_SECS")]
    pub refresh_threshold_secs: u64,

    /// Channel heartbeat interval in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "BOARDGATE_HEARTBEAT_MS")]
    pub heartbeat_ms: u64,

    /// Base reconnect backoff in milliseconds.
    #[arg(long, default_value_t = 1_000, env = "BOARDGATE_BACKOFF_BASE_MS")]
    pub backoff_base_ms: u64,

    /// Maximum reconnect backoff in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "BOARDGATE_BACKOFF_MAX_MS")]
    pub backoff_max_ms: u64,

    /// Reconnect attempts before a channel gives up.
    #[arg(long, default_value_t = 10, env = "BOARDGATE_MAX_RETRIES")]
    pub max_retries: u32,
}

impl GateConfig {
    pub fn max_logout_age(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.max_logout_age_ms)
    }

    pub fn refresh_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.refresh_timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.heartbeat_ms)
    }

    pub fn backoff_base(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.backoff_max_ms)
    }

    /// WebSocket base URL: explicit `ws_base`, else `api_base` with the
    /// scheme switched to ws(s).
    pub fn ws_base_url(&self) -> String {
        match &self.ws_base {
            Some(base) => base.trim_end_matches('/').to_owned(),
            None => {
                let base = self.api_base.trim_end_matches('/');
                if let Some(rest) = base.strip_prefix("https://") {
                    format!("wss://{rest}")
                } else if let Some(rest) = base.strip_prefix("http://") {
                    format!("ws://{rest}")
                } else {
                    base.to_owned()
                }
            }
        }
    }
}
