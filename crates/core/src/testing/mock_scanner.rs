//! Scripted scanner for testing the supervisor.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::item::RawItem;
use crate::scanner::{ItemSink, ScanError, ScanSession, Scanner};

/// How one scripted session behaves.
#[derive(Debug, Clone)]
pub enum ScriptedSession {
    /// `scan` itself fails.
    FailToStart(String),
    /// Emit items, wait, then fail.
    EmitThenFail {
        items: Vec<RawItem>,
        after: Duration,
        error: String,
    },
    /// Emit items, then run until stopped.
    RunUntilStopped { items: Vec<RawItem> },
}

impl ScriptedSession {
    pub fn fail_to_start(error: &str) -> Self {
        Self::FailToStart(error.to_string())
    }

    pub fn fail_now(error: &str) -> Self {
        Self::emit_then_fail(Vec::new(), Duration::ZERO, error)
    }

    pub fn emit_then_fail(items: Vec<RawItem>, after: Duration, error: &str) -> Self {
        Self::EmitThenFail {
            items,
            after,
            error: error.to_string(),
        }
    }

    pub fn run_until_stopped(items: Vec<RawItem>) -> Self {
        Self::RunUntilStopped { items }
    }
}

/// Mock implementation of the [`Scanner`] trait.
///
/// Each `scan` call plays the next scripted session. Once the script is
/// exhausted, sessions run until stopped without emitting anything.
///
/// # Example
///
/// ```rust,ignore
/// let scanner = MockScanner::new();
/// scanner.push(ScriptedSession::fail_now("connection reset")).await;
/// scanner.push(ScriptedSession::run_until_stopped(vec![item])).await;
/// ```
#[derive(Debug, Default)]
pub struct MockScanner {
    script: Arc<RwLock<VecDeque<ScriptedSession>>>,
    calls: Arc<RwLock<Vec<Vec<String>>>>,
    stopped: Arc<RwLock<u32>>,
}

impl MockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the behavior of the next session.
    pub async fn push(&self, session: ScriptedSession) {
        self.script.write().await.push_back(session);
    }

    pub async fn scan_calls(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Sources passed to each `scan` call.
    pub async fn recorded_sources(&self) -> Vec<Vec<String>> {
        self.calls.read().await.clone()
    }

    /// Sessions that ended because they were stopped.
    pub async fn stopped_sessions(&self) -> u32 {
        *self.stopped.read().await
    }
}

#[async_trait]
impl Scanner for MockScanner {
    async fn scan(&self, sources: &[String], sink: ItemSink) -> Result<ScanSession, ScanError> {
        self.calls.write().await.push(sources.to_vec());

        let next = self
            .script
            .write()
            .await
            .pop_front()
            .unwrap_or(ScriptedSession::RunUntilStopped { items: Vec::new() });

        let stop = CancellationToken::new();
        let token = stop.clone();
        let stopped = self.stopped.clone();

        match next {
            ScriptedSession::FailToStart(error) => Err(ScanError::Connection(error)),
            ScriptedSession::EmitThenFail {
                items,
                after,
                error,
            } => Ok(ScanSession::spawn(stop, async move {
                for item in items {
                    sink(item);
                }
                tokio::select! {
                    _ = token.cancelled() => {
                        *stopped.write().await += 1;
                        Ok(())
                    }
                    _ = tokio::time::sleep(after) => Err(ScanError::Connection(error)),
                }
            })),
            ScriptedSession::RunUntilStopped { items } => Ok(ScanSession::spawn(stop, async move {
                for item in items {
                    sink(item);
                }
                token.cancelled().await;
                *stopped.write().await += 1;
                Ok(())
            })),
        }
    }
}
