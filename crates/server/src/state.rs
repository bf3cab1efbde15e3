use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use dissic_core::{Config, PendingAuth, SanitizedConfig, SupervisorState};

/// Shared application state
pub struct AppState {
    config: Config,
    auth: Arc<PendingAuth>,
    scanner_state: OnceLock<watch::Receiver<SupervisorState>>,
}

impl AppState {
    pub fn new(config: Config, auth: Arc<PendingAuth>) -> Self {
        Self {
            config,
            auth,
            scanner_state: OnceLock::new(),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn auth(&self) -> &PendingAuth {
        self.auth.as_ref()
    }

    /// Attach the supervisor once the pipeline is running.
    pub fn set_scanner_state(&self, state: watch::Receiver<SupervisorState>) {
        let _ = self.scanner_state.set(state);
    }

    /// Current supervisor state, `None` before the pipeline starts.
    pub fn scanner_state(&self) -> Option<SupervisorState> {
        self.scanner_state.get().map(|rx| *rx.borrow())
    }
}
