use std::sync::Arc;

use tracing::{debug, warn};

use crate::external_catalog::{Catalog, CatalogError, Track};
use crate::item::RawItem;

use super::matcher::find_match;
use super::query_builder::{build_query, SEPARATORS};
use super::track_url::track_id_from_url;
use super::ResolveError;

/// How a track was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedBy {
    /// Direct track link.
    Url,
    /// Title search with the given separator.
    Title {
        title: String,
        separator: &'static str,
    },
}

impl ResolvedBy {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            ResolvedBy::Url => "url",
            ResolvedBy::Title { .. } => "title",
        }
    }
}

/// A resolved track.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub track: Track,
    pub method: ResolvedBy,
}

/// Resolves raw items against a catalog.
pub struct Resolver {
    catalog: Arc<dyn Catalog>,
}

impl Resolver {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Resolve an item to a single track.
    ///
    /// A failed direct-link lookup falls through to title search.
    pub async fn resolve(&self, item: &RawItem) -> Result<Resolution, ResolveError> {
        if let Some(url) = item.direct_url() {
            match self.resolve_url(url).await {
                Ok(track) => {
                    return Ok(Resolution {
                        track,
                        method: ResolvedBy::Url,
                    })
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "Direct track lookup failed, trying titles");
                }
            }
        }

        self.resolve_titles(&item.candidate_titles()).await
    }

    /// Look up the track a direct link points to.
    pub async fn resolve_url(&self, url: &str) -> Result<Track, ResolveError> {
        let id = track_id_from_url(url)?;
        Ok(self.catalog.get_track(&id).await?)
    }

    /// Search every title with every separator until a result matches.
    ///
    /// Search failures don't stop the walk. If no search succeeded at all,
    /// the last failure is returned instead of [`ResolveError::NotFound`].
    pub async fn resolve_titles(&self, titles: &[&str]) -> Result<Resolution, ResolveError> {
        let mut searched = false;
        let mut last_error: Option<CatalogError> = None;

        for title in titles {
            for separator in SEPARATORS {
                let query = match build_query(title, separator) {
                    Ok(query) => query,
                    Err(e) => {
                        debug!(error = %e, "Skipping separator");
                        continue;
                    }
                };

                let tracks = match self.catalog.search_tracks(&query).await {
                    Ok(tracks) => {
                        searched = true;
                        tracks
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "Track search failed");
                        last_error = Some(e);
                        continue;
                    }
                };

                if let Some(track) = find_match(title, &tracks) {
                    debug!(
                        title = %title,
                        separator = %separator,
                        track_id = %track.id,
                        "Matched search result"
                    );
                    return Ok(Resolution {
                        track: track.clone(),
                        method: ResolvedBy::Title {
                            title: title.to_string(),
                            separator,
                        },
                    });
                }
            }
        }

        match last_error {
            Some(e) if !searched => Err(ResolveError::Catalog(e)),
            _ => Err(ResolveError::NotFound),
        }
    }
}
