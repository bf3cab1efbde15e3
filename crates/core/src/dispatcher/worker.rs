use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::item::RawItem;
use crate::metrics;
use crate::resolver::{ResolvedBy, Resolver};
use crate::router::{AppendOutcome, Router};

use super::DispatchError;

/// A successfully handled item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedItem {
    pub track_id: String,
    pub playlist_id: String,
    pub method: ResolvedBy,
    pub outcome: AppendOutcome,
}

/// Resolve, route and append one item, in that order.
pub async fn process_item(
    resolver: &Resolver,
    router: &Router,
    item: &RawItem,
) -> Result<ProcessedItem, DispatchError> {
    let resolution = resolver.resolve(item).await?;
    metrics::ITEMS_RESOLVED
        .with_label_values(&[resolution.method.label()])
        .inc();

    let playlist_id = router.route(&item.origin)?.to_string();
    let outcome = router.append(&playlist_id, &resolution.track.id).await?;

    Ok(ProcessedItem {
        track_id: resolution.track.id,
        playlist_id,
        method: resolution.method,
        outcome,
    })
}

/// Owns the item queue and spawns one task per item.
pub struct Dispatcher {
    rx: mpsc::UnboundedReceiver<RawItem>,
    resolver: Arc<Resolver>,
    router: Arc<Router>,
    limit: Option<Arc<Semaphore>>,
    tracker: TaskTracker,
}

impl Dispatcher {
    /// `max_concurrent` of 0 leaves the fan-out unbounded.
    pub fn new(
        rx: mpsc::UnboundedReceiver<RawItem>,
        resolver: Arc<Resolver>,
        router: Arc<Router>,
        max_concurrent: usize,
    ) -> Self {
        let limit = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self {
            rx,
            resolver,
            router,
            limit,
            tracker: TaskTracker::new(),
        }
    }

    /// Process items until `shutdown` is cancelled or every handle is dropped.
    ///
    /// Items still queued at shutdown are discarded. In-flight tasks are
    /// awaited, never aborted.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            max_concurrent = self.limit.as_ref().map(|s| s.available_permits()).unwrap_or(0),
            "Dispatcher started"
        );

        let mut discarded = 0usize;

        loop {
            let item = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                item = self.rx.recv() => match item {
                    Some(item) => item,
                    None => break,
                },
            };

            let permit = match &self.limit {
                Some(semaphore) => tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        discarded += 1;
                        break;
                    }
                    permit = semaphore.clone().acquire_owned() => permit.ok(),
                },
                None => None,
            };

            let resolver = Arc::clone(&self.resolver);
            let router = Arc::clone(&self.router);
            self.tracker.spawn(async move {
                let _permit = permit;
                metrics::ITEMS_IN_FLIGHT.inc();
                handle_item(&resolver, &router, item).await;
                metrics::ITEMS_IN_FLIGHT.dec();
            });
        }

        self.rx.close();
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            warn!(discarded, "Discarded queued items on shutdown");
            metrics::ITEMS_DROPPED
                .with_label_values(&["shutdown"])
                .inc_by(discarded as u64);
        }

        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(in_flight = self.tracker.len(), "Waiting for in-flight items");
        }
        self.tracker.wait().await;

        info!("Dispatcher stopped");
    }
}

async fn handle_item(resolver: &Resolver, router: &Router, item: RawItem) {
    debug!(origin = %item.origin, title = %item.post_title, "Processing item");

    match process_item(resolver, router, &item).await {
        Ok(processed) => {
            metrics::APPENDS
                .with_label_values(&[processed.outcome.label()])
                .inc();
            if processed.outcome == AppendOutcome::AlreadyExists {
                info!(
                    origin = %item.origin,
                    track_id = %processed.track_id,
                    playlist_id = %processed.playlist_id,
                    "Track already in playlist"
                );
            }
        }
        Err(e) => {
            if e.reason() == "append_failed" {
                metrics::APPENDS.with_label_values(&["failed"]).inc();
            }
            metrics::ITEMS_DROPPED.with_label_values(&[e.reason()]).inc();
            warn!(
                origin = %item.origin,
                title = %item.post_title,
                permalink = item.permalink.as_deref().unwrap_or(""),
                error = %e,
                "Dropping item"
            );
        }
    }
}
