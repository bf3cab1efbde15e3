use std::sync::Arc;

use tracing::{debug, info};

use crate::external_catalog::CollectionService;

use super::{AppendOutcome, RouterError, RoutingTable};

/// Routes items to playlists and appends tracks.
pub struct Router {
    table: Arc<RoutingTable>,
    collections: Arc<dyn CollectionService>,
}

impl Router {
    pub fn new(table: Arc<RoutingTable>, collections: Arc<dyn CollectionService>) -> Self {
        Self { table, collections }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Playlist ID for `origin`.
    pub fn route(&self, origin: &str) -> Result<&str, RouterError> {
        self.table.route(origin)
    }

    /// Append `track_id` unless the playlist already contains it.
    ///
    /// The membership check and the append are separate calls, so a track
    /// added concurrently by someone else can still end up duplicated.
    pub async fn append(
        &self,
        playlist_id: &str,
        track_id: &str,
    ) -> Result<AppendOutcome, RouterError> {
        let to_append_error = |source| RouterError::Append {
            playlist_id: playlist_id.to_string(),
            source,
        };

        let members = self
            .collections
            .list_track_ids(playlist_id)
            .await
            .map_err(to_append_error)?;

        if members.iter().any(|id| id == track_id) {
            debug!(playlist_id = %playlist_id, track_id = %track_id, "Already in playlist");
            return Ok(AppendOutcome::AlreadyExists);
        }

        let snapshot_id = self
            .collections
            .add_track(playlist_id, track_id)
            .await
            .map_err(to_append_error)?;

        info!(
            playlist_id = %playlist_id,
            track_id = %track_id,
            snapshot_id = %snapshot_id,
            "Added track to playlist"
        );
        Ok(AppendOutcome::Appended { snapshot_id })
    }
}
