//! Catalog search and playlist (collection) services.
//!
//! The pipeline only talks to these through the [`Catalog`] and
//! [`CollectionService`] traits. [`SpotifyClient`] implements both against the
//! Spotify Web API.

mod spotify;
mod types;

pub use spotify::{SpotifyClient, SpotifyClientConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthError;

/// Errors that can occur when talking to the catalog or collection service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Access token rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Could not obtain an access token.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
}

/// Searchable track catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Search tracks by free-text query.
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogError>;

    /// Get a specific track by catalog ID.
    async fn get_track(&self, id: &str) -> Result<Track, CatalogError>;
}

/// Playlists owned by the authenticated user.
#[async_trait]
pub trait CollectionService: Send + Sync {
    /// The account the service acts as.
    async fn current_user(&self) -> Result<User, CatalogError>;

    /// All playlists of `owner`.
    async fn list_playlists(&self, owner: &str) -> Result<Vec<Playlist>, CatalogError>;

    async fn get_playlist(&self, id: &str) -> Result<Playlist, CatalogError>;

    async fn create_playlist(
        &self,
        owner: &str,
        playlist: &NewPlaylist,
    ) -> Result<Playlist, CatalogError>;

    /// IDs of every track currently in the playlist.
    async fn list_track_ids(&self, playlist_id: &str) -> Result<Vec<String>, CatalogError>;

    /// Append a track, returning the playlist snapshot ID.
    async fn add_track(&self, playlist_id: &str, track_id: &str) -> Result<String, CatalogError>;
}
