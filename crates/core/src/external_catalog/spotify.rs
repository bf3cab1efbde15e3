//! Spotify Web API client.
//!
//! Implements both [`Catalog`] and [`CollectionService`]. Built once after
//! authentication and shared read-only between all resolution tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{Artist, NewPlaylist, Playlist, Track, User};
use super::{Catalog, CatalogError, CollectionService};
use crate::auth::AccessTokenSource;
use crate::metrics::record_external_call;

const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Spotify API client configuration.
#[derive(Debug, Clone)]
pub struct SpotifyClientConfig {
    /// Base URL (default: https://api.spotify.com/v1).
    pub base_url: Option<String>,
    /// Search results fetched per query.
    pub search_limit: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SpotifyClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            search_limit: 20,
            timeout_secs: 30,
        }
    }
}

/// Spotify Web API client.
pub struct SpotifyClient {
    client: Client,
    base_url: String,
    search_limit: u32,
    tokens: Arc<dyn AccessTokenSource>,
}

impl SpotifyClient {
    /// Create a new Spotify client.
    pub fn new(
        config: SpotifyClientConfig,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            search_limit: config.search_limit.clamp(1, 50),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an authorized request and decode the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
        subject: &str,
    ) -> Result<T, CatalogError> {
        let started = Instant::now();
        let result = self.send_inner(request, subject).await;
        record_external_call(
            "spotify",
            operation,
            result.is_ok(),
            started.elapsed().as_secs_f64(),
        );
        result
    }

    async fn send_inner<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        subject: &str,
    ) -> Result<T, CatalogError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Spotify rate limit exceeded");
                return Err(CatalogError::RateLimitExceeded);
            }
            StatusCode::UNAUTHORIZED => {
                let body = response.text().await.unwrap_or_default();
                return Err(CatalogError::Unauthorized(body));
            }
            StatusCode::NOT_FOUND => {
                return Err(CatalogError::NotFound(subject.to_string()));
            }
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(CatalogError::ApiError {
                    status: status.as_u16(),
                    message: body.chars().take(200).collect(),
                });
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }

    /// Follow `next` links until every page has been collected.
    async fn collect_pages<T: DeserializeOwned>(
        &self,
        first: RequestBuilder,
        operation: &'static str,
        subject: &str,
    ) -> Result<Vec<T>, CatalogError> {
        let mut page: Page<T> = self.send(first, operation, subject).await?;
        let mut items = std::mem::take(&mut page.items);

        while let Some(next) = page.next.take() {
            page = self.send(self.client.get(&next), operation, subject).await?;
            items.append(&mut page.items);
        }

        Ok(items)
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogError> {
        debug!("Spotify search: query='{}'", query);

        let limit = self.search_limit.to_string();
        let request = self.client.get(self.url("/search")).query(&[
            ("q", query),
            ("type", "track"),
            ("limit", limit.as_str()),
        ]);

        let response: SearchResponse = self.send(request, "search", query).await?;
        Ok(response
            .tracks
            .map(|page| page.items.into_iter().filter_map(ApiTrack::into_track).collect())
            .unwrap_or_default())
    }

    async fn get_track(&self, id: &str) -> Result<Track, CatalogError> {
        debug!("Spotify get track: id={}", id);

        let request = self
            .client
            .get(self.url(&format!("/tracks/{}", urlencoding::encode(id))));
        let track: ApiTrack = self.send(request, "get_track", id).await?;
        track
            .into_track()
            .ok_or_else(|| CatalogError::ParseError(format!("track {} has no id", id)))
    }
}

#[async_trait]
impl CollectionService for SpotifyClient {
    async fn current_user(&self) -> Result<User, CatalogError> {
        let request = self.client.get(self.url("/me"));
        let user: ApiUser = self.send(request, "current_user", "me").await?;
        Ok(User {
            id: user.id,
            display_name: user.display_name,
        })
    }

    async fn list_playlists(&self, owner: &str) -> Result<Vec<Playlist>, CatalogError> {
        let request = self
            .client
            .get(self.url(&format!("/users/{}/playlists", urlencoding::encode(owner))))
            .query(&[("limit", "50")]);
        let playlists: Vec<ApiPlaylist> =
            self.collect_pages(request, "list_playlists", owner).await?;
        Ok(playlists.into_iter().map(Playlist::from).collect())
    }

    async fn get_playlist(&self, id: &str) -> Result<Playlist, CatalogError> {
        let request = self
            .client
            .get(self.url(&format!("/playlists/{}", urlencoding::encode(id))))
            .query(&[("fields", "id,name,owner(id)")]);
        let playlist: ApiPlaylist = self.send(request, "get_playlist", id).await?;
        Ok(playlist.into())
    }

    async fn create_playlist(
        &self,
        owner: &str,
        playlist: &NewPlaylist,
    ) -> Result<Playlist, CatalogError> {
        let request = self
            .client
            .post(self.url(&format!("/users/{}/playlists", urlencoding::encode(owner))))
            .json(&CreatePlaylistBody {
                name: &playlist.name,
                description: &playlist.description,
                public: playlist.public,
            });
        let created: ApiPlaylist = self
            .send(request, "create_playlist", &playlist.name)
            .await?;
        Ok(created.into())
    }

    async fn list_track_ids(&self, playlist_id: &str) -> Result<Vec<String>, CatalogError> {
        let request = self
            .client
            .get(self.url(&format!(
                "/playlists/{}/tracks",
                urlencoding::encode(playlist_id)
            )))
            .query(&[("fields", "items(track(id)),next"), ("limit", "100")]);
        let items: Vec<ApiPlaylistItem> = self
            .collect_pages(request, "list_playlist_tracks", playlist_id)
            .await?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.track.and_then(|t| t.id))
            .collect())
    }

    async fn add_track(&self, playlist_id: &str, track_id: &str) -> Result<String, CatalogError> {
        let uri = format!("spotify:track:{}", track_id);
        let request = self
            .client
            .post(self.url(&format!(
                "/playlists/{}/tracks",
                urlencoding::encode(playlist_id)
            )))
            .json(&AddTracksBody {
                uris: vec![uri.as_str()],
            });
        let snapshot: SnapshotResponse = self.send(request, "add_track", playlist_id).await?;
        Ok(snapshot.snapshot_id)
    }
}

// ============================================================================
// Spotify API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: Option<Page<ApiTrack>>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    /// Local files have no id.
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
}

impl ApiTrack {
    fn into_track(self) -> Option<Track> {
        let id = self.id?;
        Some(Track {
            id,
            name: self.name,
            artists: self
                .artists
                .into_iter()
                .map(|a| Artist {
                    id: a.id.unwrap_or_default(),
                    name: a.name,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    id: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylist {
    id: String,
    name: String,
    #[serde(default)]
    owner: Option<ApiOwner>,
}

impl From<ApiPlaylist> for Playlist {
    fn from(p: ApiPlaylist) -> Self {
        Playlist {
            id: p.id,
            name: p.name,
            owner_id: p.owner.map(|o| o.id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylistItem {
    track: Option<ApiTrackRef>,
}

#[derive(Debug, Deserialize)]
struct ApiTrackRef {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    snapshot_id: String,
}

#[derive(Serialize)]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    description: &'a str,
    public: bool,
}

#[derive(Serialize)]
struct AddTracksBody<'a> {
    uris: Vec<&'a str>,
}
