//! Testing utilities and mock implementations.
//!
//! Mock implementations of every external service trait, so the whole
//! pipeline can be exercised without Reddit or Spotify.
//!
//! # Example
//!
//! ```rust,ignore
//! use dissic_core::testing::{fixtures, MockCatalog, MockCollections, MockScanner};
//!
//! let catalog = MockCatalog::new();
//! let collections = MockCollections::new();
//! let scanner = MockScanner::new();
//!
//! // Configure mock responses
//! catalog.add_search_results("Artist Song", vec![fixtures::track("t1", "Song", &["Artist"])]).await;
//! collections.add_playlist(fixtures::playlist("p1", "Music")).await;
//! ```

mod mock_catalog;
mod mock_collections;
mod mock_scanner;

pub use mock_catalog::MockCatalog;
pub use mock_collections::MockCollections;
pub use mock_scanner::{MockScanner, ScriptedSession};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{Config, PlaylistSpec, RedditConfig, SpotifyConfig};
    use crate::external_catalog::{Artist, Playlist, Track};
    use crate::item::RawItem;

    /// A track with the given artists.
    pub fn track(id: &str, name: &str, artists: &[&str]) -> Track {
        Track {
            id: id.to_string(),
            name: name.to_string(),
            artists: artists
                .iter()
                .map(|artist| Artist {
                    id: format!("artist-{}", artist.to_lowercase().replace(' ', "-")),
                    name: artist.to_string(),
                })
                .collect(),
        }
    }

    /// A playlist owned by `mock-user`.
    pub fn playlist(id: &str, name: &str) -> Playlist {
        Playlist {
            id: id.to_string(),
            name: name.to_string(),
            owner_id: Some("mock-user".to_string()),
        }
    }

    /// A post from `origin` whose title is `"<artist> - <song>"`.
    pub fn post(origin: &str, artist: &str, song: &str) -> RawItem {
        RawItem::new(origin, format!("{} - {}", artist, song))
            .with_permalink(format!("https://www.reddit.com/r/{}/comments/x/", origin))
    }

    /// A valid configuration with one playlist per `(name, subreddits)` pair.
    pub fn config(playlists: &[(&str, &[&str])]) -> Config {
        Config {
            reddit: RedditConfig {
                username: "tester".to_string(),
                ..RedditConfig::default()
            },
            spotify: SpotifyConfig {
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                ..SpotifyConfig::default()
            },
            server: Default::default(),
            dispatcher: Default::default(),
            playlists: playlists
                .iter()
                .map(|(name, subs)| PlaylistSpec {
                    name: Some(name.to_string()),
                    id: None,
                    subreddits: subs.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
            verbose: false,
        }
    }
}
