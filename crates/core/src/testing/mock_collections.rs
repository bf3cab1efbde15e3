//! Mock playlist service for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::external_catalog::{CatalogError, CollectionService, NewPlaylist, Playlist, User};

/// Internal state for a mock playlist.
#[derive(Debug, Clone)]
struct MockPlaylistState {
    playlist: Playlist,
    tracks: Vec<String>,
}

/// Mock implementation of the [`CollectionService`] trait.
///
/// Playlists live in memory. Created playlists get sequential IDs
/// (`created-1`, `created-2`, ...), every add returns a fresh snapshot ID.
#[derive(Debug)]
pub struct MockCollections {
    user: User,
    playlists: Arc<RwLock<Vec<MockPlaylistState>>>,
    created: Arc<RwLock<Vec<NewPlaylist>>>,
    list_calls: Arc<RwLock<u32>>,
    snapshot_counter: Arc<RwLock<u32>>,
    /// Latency added to every `add_track` call.
    add_delay: Arc<RwLock<Duration>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl Default for MockCollections {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCollections {
    /// Mock service acting as `mock-user`.
    pub fn new() -> Self {
        Self::with_user("mock-user")
    }

    pub fn with_user(user_id: &str) -> Self {
        Self {
            user: User {
                id: user_id.to_string(),
                display_name: Some("Mock User".to_string()),
            },
            playlists: Arc::new(RwLock::new(Vec::new())),
            created: Arc::new(RwLock::new(Vec::new())),
            list_calls: Arc::new(RwLock::new(0)),
            snapshot_counter: Arc::new(RwLock::new(0)),
            add_delay: Arc::new(RwLock::new(Duration::ZERO)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Add an existing (empty) playlist.
    pub async fn add_playlist(&self, playlist: Playlist) {
        self.playlists.write().await.push(MockPlaylistState {
            playlist,
            tracks: Vec::new(),
        });
    }

    /// Track IDs in the playlist, in insertion order.
    pub async fn playlist_tracks(&self, playlist_id: &str) -> Vec<String> {
        self.playlists
            .read()
            .await
            .iter()
            .find(|p| p.playlist.id == playlist_id)
            .map(|p| p.tracks.clone())
            .unwrap_or_default()
    }

    /// Every playlist created through the service.
    pub async fn created_playlists(&self) -> Vec<NewPlaylist> {
        self.created.read().await.clone()
    }

    pub async fn list_playlists_calls(&self) -> u32 {
        *self.list_calls.read().await
    }

    /// Make every `add_track` call take `delay` before it lands.
    pub async fn set_add_delay(&self, delay: Duration) {
        *self.add_delay.write().await = delay;
    }

    /// Fail the next operation with `error`.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    async fn check_error(&self) -> Result<(), CatalogError> {
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CollectionService for MockCollections {
    async fn current_user(&self) -> Result<User, CatalogError> {
        self.check_error().await?;
        Ok(self.user.clone())
    }

    async fn list_playlists(&self, _owner: &str) -> Result<Vec<Playlist>, CatalogError> {
        *self.list_calls.write().await += 1;
        self.check_error().await?;
        Ok(self
            .playlists
            .read()
            .await
            .iter()
            .map(|p| p.playlist.clone())
            .collect())
    }

    async fn get_playlist(&self, id: &str) -> Result<Playlist, CatalogError> {
        self.check_error().await?;
        self.playlists
            .read()
            .await
            .iter()
            .find(|p| p.playlist.id == id)
            .map(|p| p.playlist.clone())
            .ok_or_else(|| CatalogError::NotFound(format!("playlist {}", id)))
    }

    async fn create_playlist(
        &self,
        owner: &str,
        playlist: &NewPlaylist,
    ) -> Result<Playlist, CatalogError> {
        self.check_error().await?;

        let mut created = self.created.write().await;
        created.push(playlist.clone());
        let new = Playlist {
            id: format!("created-{}", created.len()),
            name: playlist.name.clone(),
            owner_id: Some(owner.to_string()),
        };
        self.add_playlist(new.clone()).await;
        Ok(new)
    }

    async fn list_track_ids(&self, playlist_id: &str) -> Result<Vec<String>, CatalogError> {
        self.check_error().await?;
        self.playlists
            .read()
            .await
            .iter()
            .find(|p| p.playlist.id == playlist_id)
            .map(|p| p.tracks.clone())
            .ok_or_else(|| CatalogError::NotFound(format!("playlist {}", playlist_id)))
    }

    async fn add_track(&self, playlist_id: &str, track_id: &str) -> Result<String, CatalogError> {
        self.check_error().await?;

        let delay = *self.add_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut playlists = self.playlists.write().await;
        let state = playlists
            .iter_mut()
            .find(|p| p.playlist.id == playlist_id)
            .ok_or_else(|| CatalogError::NotFound(format!("playlist {}", playlist_id)))?;
        state.tracks.push(track_id.to_string());

        let mut counter = self.snapshot_counter.write().await;
        *counter += 1;
        Ok(format!("snapshot-{}", *counter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_create_then_add() {
        let collections = MockCollections::new();
        let playlist = collections
            .create_playlist(
                "mock-user",
                &NewPlaylist {
                    name: "New".to_string(),
                    description: String::new(),
                    public: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(playlist.id, "created-1");
        assert_eq!(collections.add_track("created-1", "t1").await.unwrap(), "snapshot-1");
        assert_eq!(collections.playlist_tracks("created-1").await, vec!["t1"]);
        assert_eq!(collections.list_playlists("mock-user").await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_delay() {
        let collections = MockCollections::new();
        collections.add_playlist(fixtures::playlist("p1", "One")).await;
        collections.set_add_delay(Duration::from_secs(3)).await;

        let started = tokio::time::Instant::now();
        collections.add_track("p1", "t1").await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(collections.playlist_tracks("p1").await, vec!["t1"]);
    }

    #[tokio::test]
    async fn test_unknown_playlist() {
        let collections = MockCollections::new();
        collections.add_playlist(fixtures::playlist("p1", "One")).await;

        assert!(collections.get_playlist("p1").await.is_ok());
        assert!(matches!(
            collections.add_track("p2", "t1").await,
            Err(CatalogError::NotFound(_))
        ));
    }
}
