//! One-shot OAuth handshake between the HTTP callback and startup.

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

use super::spotify::{AuthSession, SpotifyAuthenticator};
use super::types::CallbackParams;
use super::AuthError;

/// Waits for the OAuth redirect and hands the resulting session to startup.
pub struct PendingAuth {
    authenticator: Arc<SpotifyAuthenticator>,
    tx: Mutex<Option<oneshot::Sender<Arc<AuthSession>>>>,
}

impl PendingAuth {
    /// Create the handshake. The receiver resolves once a callback succeeds.
    pub fn new(
        authenticator: Arc<SpotifyAuthenticator>,
    ) -> (Self, oneshot::Receiver<Arc<AuthSession>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                authenticator,
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    pub fn authorize_url(&self) -> String {
        self.authenticator.authorize_url()
    }

    /// Handle one callback request.
    ///
    /// Rejected callbacks leave the handshake pending so the user can retry.
    pub async fn complete(&self, params: &CallbackParams) -> Result<(), AuthError> {
        if let Some(error) = &params.error {
            warn!(error = %error, "Authorization was denied");
            return Err(AuthError::Denied(error.clone()));
        }

        let state = params.state.as_deref().unwrap_or_default();
        if !constant_time_eq(state.as_bytes(), self.authenticator.state().as_bytes()) {
            warn!("Rejected callback with mismatching state");
            return Err(AuthError::StateMismatch);
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCode)?;

        let mut tx = self.tx.lock().await;
        if tx.is_none() {
            return Err(AuthError::AlreadyCompleted);
        }

        let token = self.authenticator.exchange_code(code).await?;
        let session = Arc::new(AuthSession::new(Arc::clone(&self.authenticator), token));

        if let Some(tx) = tx.take() {
            if tx.send(session).is_err() {
                warn!("Authentication completed but nobody is waiting for it");
            }
        }
        info!("Authenticated");

        Ok(())
    }

    /// True once a callback has succeeded.
    pub async fn is_completed(&self) -> bool {
        self.tx.lock().await.is_none()
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
