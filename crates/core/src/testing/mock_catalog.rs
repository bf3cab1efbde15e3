//! Mock track catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::external_catalog::{Catalog, CatalogError, Track};

/// Mock implementation of the [`Catalog`] trait.
///
/// Search results are keyed by the exact query string. Every search is
/// recorded, including failed ones.
///
/// # Example
///
/// ```rust,ignore
/// use dissic_core::testing::{fixtures, MockCatalog};
///
/// let catalog = MockCatalog::new();
/// catalog
///     .add_search_results("Artist Song", vec![fixtures::track("t1", "Song", &["Artist"])])
///     .await;
///
/// let results = catalog.search_tracks("Artist Song").await?;
/// assert_eq!(results.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockCatalog {
    /// Search results by query.
    results: Arc<RwLock<HashMap<String, Vec<Track>>>>,
    /// Tracks by ID, for direct lookups.
    tracks: Arc<RwLock<HashMap<String, Track>>>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<String>>>,
    /// Recorded direct lookups.
    lookups: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(HashMap::new())),
            tracks: Arc::new(RwLock::new(HashMap::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            lookups: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Results returned for `query`. Tracks are also made available by ID.
    pub async fn add_search_results(&self, query: &str, tracks: Vec<Track>) {
        {
            let mut by_id = self.tracks.write().await;
            for track in &tracks {
                by_id.insert(track.id.clone(), track.clone());
            }
        }
        self.results.write().await.insert(query.to_string(), tracks);
    }

    /// Make a track available by ID.
    pub async fn add_track(&self, track: Track) {
        self.tracks.write().await.insert(track.id.clone(), track);
    }

    /// Fail the next operation with `error`.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Every search query, in call order.
    pub async fn searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    /// Every direct lookup ID, in call order.
    pub async fn lookups(&self) -> Vec<String> {
        self.lookups.read().await.clone()
    }

    async fn take_error(&self) -> Option<CatalogError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogError> {
        self.searches.write().await.push(query.to_string());

        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        Ok(self
            .results
            .read()
            .await
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_track(&self, id: &str) -> Result<Track, CatalogError> {
        self.lookups.write().await.push(id.to_string());

        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        self.tracks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("track {}", id)))
    }
}
