use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::item::RawItem;
use crate::metrics;
use crate::scanner::ItemSink;

/// Handle for submitting items to the dispatcher.
///
/// Cheaply cloneable. Submission never blocks and never fails; items
/// submitted after the dispatcher stopped are logged and dropped.
#[derive(Clone, Debug)]
pub struct DispatcherHandle {
    tx: mpsc::UnboundedSender<RawItem>,
}

impl DispatcherHandle {
    pub fn new(tx: mpsc::UnboundedSender<RawItem>) -> Self {
        Self { tx }
    }

    /// Enqueue an item.
    pub fn submit(&self, item: RawItem) {
        metrics::ITEMS_INGESTED.inc();
        if let Err(e) = self.tx.send(item) {
            warn!(origin = %e.0.origin, "Dispatcher stopped, dropping item");
            metrics::ITEMS_DROPPED.with_label_values(&["shutdown"]).inc();
        }
    }

    /// Whether the dispatcher has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Callback form of [`submit`](Self::submit) for scanners.
    pub fn into_sink(self) -> ItemSink {
        Arc::new(move |item| self.submit(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_enqueues() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = DispatcherHandle::new(tx);

        handle.submit(RawItem::new("music", "Artist - Song"));

        let item = rx.recv().await.unwrap();
        assert_eq!(item.post_title, "Artist - Song");
    }

    #[tokio::test]
    async fn test_sink_submits() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = DispatcherHandle::new(tx).into_sink();

        sink(RawItem::new("r/Music", "a - b"));
        sink(RawItem::new("jazz", "c - d"));

        assert_eq!(rx.recv().await.unwrap().origin, "music");
        assert_eq!(rx.recv().await.unwrap().origin, "jazz");
    }

    #[test]
    fn test_submit_after_close_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = DispatcherHandle::new(tx);
        drop(rx);

        assert!(handle.is_closed());
        handle.submit(RawItem::new("music", "Artist - Song"));
    }
}
