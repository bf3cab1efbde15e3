//! Scanner supervisor - keeps the ingestion feed alive.
//!
//! State machine: `Idle -> Scanning -> (Waiting | Scanning | Stopped)`.
//!
//! Every ended session counts as a failure. The failure counter is reset
//! only once a session is confirmed active (first item delivered, or alive
//! for the confirmation window). Reaching the maximum cancels the
//! process-root shutdown token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::RedditConfig;
use crate::item::normalize_source_name;
use crate::metrics;

use super::traits::{ItemSink, Scanner};
use super::types::{RetryDecision, RetryState, ScanError, SupervisorError, SupervisorState};

/// Supervisor tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub max_retry_attempts: u32,
    pub retry_wait: Duration,
    pub confirm_after: Duration,
}

impl SupervisorConfig {
    pub fn from_reddit(config: &RedditConfig) -> Self {
        Self {
            max_retry_attempts: config.max_retry_attempts,
            retry_wait: Duration::from_secs(config.retry_wait_secs),
            confirm_after: Duration::from_secs(config.session_confirm_secs),
        }
    }
}

/// Owns the retry loop around a [`Scanner`].
pub struct ScannerSupervisor {
    scanner: Arc<dyn Scanner>,
    sources: Vec<String>,
    sink: ItemSink,
    retry: RetryState,
    confirm_after: Duration,
    state: watch::Sender<SupervisorState>,
}

impl ScannerSupervisor {
    pub fn new(
        scanner: Arc<dyn Scanner>,
        sources: &[String],
        sink: ItemSink,
        config: &SupervisorConfig,
    ) -> Self {
        let mut normalized: Vec<String> = Vec::with_capacity(sources.len());
        for source in sources {
            let name = normalize_source_name(source);
            if !name.is_empty() && !normalized.contains(&name) {
                normalized.push(name);
            }
        }
        let (state, _) = watch::channel(SupervisorState::Idle);

        Self {
            scanner,
            sources: normalized,
            sink,
            retry: RetryState::new(config.max_retry_attempts, config.retry_wait),
            confirm_after: config.confirm_after,
            state,
        }
    }

    /// Watch supervisor state changes.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Run until `shutdown` is cancelled or retries are exhausted.
    ///
    /// On exhaustion `shutdown` is cancelled before returning
    /// [`SupervisorError::RetryExhausted`].
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), SupervisorError> {
        info!(sources = ?self.sources, "Scanner supervisor started");

        while !shutdown.is_cancelled() {
            let Some(result) = self.run_session(&shutdown).await else {
                break;
            };

            self.set_state(SupervisorState::Waiting);
            metrics::SCAN_SESSIONS.with_label_values(&["failed"]).inc();
            match &result {
                Ok(()) => warn!("Scan session ended"),
                Err(e) => {
                    metrics::SCAN_ERRORS.inc();
                    warn!(error = %e, "Scan session failed");
                }
            }

            match self.retry.record_failure() {
                RetryDecision::Exhausted { attempts } => {
                    metrics::SCAN_FAILURE_STREAK.set(attempts as i64);
                    error!(attempts, "Scanner failed too many times, shutting down");
                    self.set_state(SupervisorState::Stopped);
                    shutdown.cancel();
                    return Err(SupervisorError::RetryExhausted { attempts });
                }
                RetryDecision::Retry { attempt, wait } => {
                    metrics::SCAN_FAILURE_STREAK.set(attempt as i64);
                    info!(
                        attempt,
                        max_attempts = self.retry.max_attempts(),
                        wait_secs = wait.as_secs(),
                        "Restarting scanner after backoff"
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }

        self.set_state(SupervisorState::Stopped);
        info!("Scanner supervisor stopped");
        Ok(())
    }

    /// One session. `None` means it ended because of shutdown.
    async fn run_session(
        &mut self,
        shutdown: &CancellationToken,
    ) -> Option<Result<(), ScanError>> {
        let delivered = Arc::new(Notify::new());
        let sink = confirming_sink(self.sink.clone(), delivered.clone());

        self.set_state(SupervisorState::Scanning);
        let started = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return None,
            started = self.scanner.scan(&self.sources, sink) => started,
        };
        let mut session = match started {
            Ok(session) => session,
            Err(e) => return Some(Err(e)),
        };
        metrics::SCAN_SESSIONS.with_label_values(&["started"]).inc();
        debug!("Scan session started");

        let confirm = tokio::time::sleep(self.confirm_after);
        tokio::pin!(confirm);
        let mut confirmed = false;
        let mut stopping = false;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled(), if !stopping => {
                    debug!("Stopping scan session");
                    session.stop();
                    stopping = true;
                }
                _ = delivered.notified(), if !confirmed => {
                    confirmed = true;
                    self.confirm("first item delivered");
                }
                _ = &mut confirm, if !confirmed => {
                    confirmed = true;
                    self.confirm("session stayed up");
                }
                result = session.wait() => {
                    return if stopping { None } else { Some(result) };
                }
            }
        }
    }

    fn confirm(&mut self, reason: &str) {
        if self.retry.failures() > 0 {
            info!(reason, failures = self.retry.failures(), "Scanner recovered");
        } else {
            debug!(reason, "Scan session confirmed");
        }
        self.retry.reset();
        metrics::SCAN_FAILURE_STREAK.set(0);
    }

    fn set_state(&self, state: SupervisorState) {
        self.state.send_replace(state);
    }
}

fn confirming_sink(inner: ItemSink, delivered: Arc<Notify>) -> ItemSink {
    let first = AtomicBool::new(true);
    Arc::new(move |item| {
        if first.swap(false, Ordering::Relaxed) {
            delivered.notify_one();
        }
        inner(item);
    })
}
