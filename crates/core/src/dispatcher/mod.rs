//! Dispatcher - fans ingested items out to independent resolve/route/append tasks.
//!
//! [`create_dispatcher`] returns a cheap, cloneable [`DispatcherHandle`] that
//! the scanner submits to, and the [`Dispatcher`] that owns the queue and is
//! driven by [`Dispatcher::run`].

mod handle;
mod worker;

pub use handle::DispatcherHandle;
pub use worker::{process_item, Dispatcher, ProcessedItem};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::DispatcherConfig;
use crate::resolver::{ResolveError, Resolver};
use crate::router::{Router, RouterError};

/// Why an item was dropped.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Route(#[from] RouterError),
}

impl DispatchError {
    /// Metric label for dropped items.
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchError::Resolve(ResolveError::NotFound) => "not_found",
            DispatchError::Resolve(ResolveError::UnsupportedUrl(_)) => "unsupported_url",
            DispatchError::Resolve(ResolveError::Catalog(_)) => "catalog_error",
            DispatchError::Route(RouterError::NoDestination { .. }) => "no_destination",
            DispatchError::Route(_) => "append_failed",
        }
    }
}

/// Create a dispatcher and the handle used to feed it.
pub fn create_dispatcher(
    resolver: Arc<Resolver>,
    router: Arc<Router>,
    config: &DispatcherConfig,
) -> (DispatcherHandle, Dispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = DispatcherHandle::new(tx);
    let dispatcher = Dispatcher::new(rx, resolver, router, config.max_concurrent_items);
    (handle, dispatcher)
}
