// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::GateConfig;
use crate::credential::store::CredentialStore;
use crate::intercept::policy::RequestPolicy;

/// Lifecycle phase of the proxy worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Installing,
    Active,
}

impl WorkerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installing => "installing",
            Self::Active => "active",
        }
    }
}

/// Shared gateway state.
pub struct GateState {
    pub config: GateConfig,
    pub store: Arc<CredentialStore>,
    pub policy: RequestPolicy,
    /// Client used to forward intercepted requests upstream.
    pub http: reqwest::Client,
    pub shutdown: CancellationToken,
    phase: AtomicU8,
}

impl GateState {
    pub fn new(config: GateConfig, shutdown: CancellationToken) -> Self {
        let state_dir =
            config.state_dir.clone().unwrap_or_else(crate::credential::state_dir);
        let store = Arc::new(CredentialStore::new(&state_dir, config.max_logout_age()));
        let policy = RequestPolicy::new(Arc::clone(&store));
        Self {
            config,
            store,
            policy,
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            shutdown,
            phase: AtomicU8::new(0),
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        match self.phase.load(Ordering::Acquire) {
            0 => WorkerPhase::Installing,
            _ => WorkerPhase::Active,
        }
    }

    /// Flip to Active. Called as soon as the listener is bound so every
    /// in-flight page sees the worker immediately, not on next navigation.
    pub fn activate(&self) {
        self.phase.store(1, Ordering::Release);
    }
}
