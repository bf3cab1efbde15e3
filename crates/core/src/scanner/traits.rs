use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::item::RawItem;

use super::ScanError;

/// Per-item callback handed to a scanner.
pub type ItemSink = Arc<dyn Fn(RawItem) + Send + Sync>;

/// A running scan: a stop handle plus a way to wait for the end.
#[derive(Debug)]
pub struct ScanSession {
    stop: CancellationToken,
    done: Option<JoinHandle<Result<(), ScanError>>>,
}

impl ScanSession {
    /// Run `task` as a session. The task must return once `stop` is cancelled.
    pub fn spawn<F>(stop: CancellationToken, task: F) -> Self
    where
        F: Future<Output = Result<(), ScanError>> + Send + 'static,
    {
        Self {
            stop,
            done: Some(tokio::spawn(task)),
        }
    }

    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Ask the session to end.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Wait for the session to end and return how it ended.
    ///
    /// Returns `Ok(())` immediately if called again after completion.
    pub async fn wait(&mut self) -> Result<(), ScanError> {
        let Some(done) = self.done.as_mut() else {
            return Ok(());
        };
        let result = done.await;
        self.done = None;
        result.map_err(|e| ScanError::Task(e.to_string()))?
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// The external scan primitive.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Start watching `sources` (normalized names), calling `sink` for every
    /// new post.
    async fn scan(&self, sources: &[String], sink: ItemSink) -> Result<ScanSession, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_returns_task_result() {
        let mut session = ScanSession::spawn(CancellationToken::new(), async {
            Err(ScanError::Connection("reset".to_string()))
        });
        assert!(matches!(session.wait().await, Err(ScanError::Connection(_))));
        assert!(session.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_stop_ends_session() {
        let stop = CancellationToken::new();
        let token = stop.clone();
        let mut session = ScanSession::spawn(stop, async move {
            token.cancelled().await;
            Ok(())
        });

        session.stop();
        assert!(session.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_drop_cancels_stop_handle() {
        let stop = CancellationToken::new();
        let session = ScanSession::spawn(stop.clone(), async { Ok(()) });
        drop(session);
        assert!(stop.is_cancelled());
    }

    #[tokio::test]
    async fn test_panicking_task_is_a_scan_error() {
        let mut session = ScanSession::spawn(CancellationToken::new(), async {
            if true {
                panic!("scanner blew up");
            }
            Ok(())
        });
        assert!(matches!(session.wait().await, Err(ScanError::Task(_))));
    }
}
