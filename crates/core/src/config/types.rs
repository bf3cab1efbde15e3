use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::item::normalize_source_name;

/// Description given to playlists dissic creates itself.
pub const PLAYLIST_DESCRIPTION: &str =
    "Auto-generated playlist. Generate your own with dissic: https://github.com/engvik/dissic";

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub reddit: RedditConfig,
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub playlists: Vec<PlaylistSpec>,
    /// Raise the default log level to debug for dissic crates.
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Every source listed under any playlist, normalized and deduplicated,
    /// in configuration order.
    pub fn subreddits(&self) -> Vec<String> {
        let mut subs: Vec<String> = Vec::new();
        for playlist in &self.playlists {
            for sub in &playlist.subreddits {
                let sub = normalize_source_name(sub);
                if !subs.contains(&sub) {
                    subs.push(sub);
                }
            }
        }
        subs
    }

    /// User agent sent to Reddit, in the format their API rules ask for.
    pub fn user_agent(&self) -> String {
        format!(
            "{}:dissic:{} (by /u/{})",
            std::env::consts::OS,
            env!("CARGO_PKG_VERSION"),
            self.reddit.username
        )
    }

    /// OAuth redirect URI, defaulting to the local callback listener.
    pub fn redirect_uri(&self) -> String {
        self.spotify
            .redirect_uri
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}/spotifyAuth", self.server.port))
    }
}

/// HTTP listener configuration (OAuth callback, health, metrics)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Reddit scanning configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedditConfig {
    #[serde(default)]
    pub username: String,
    /// Seconds between two polls of the watched subreddits.
    #[serde(default = "default_request_rate")]
    pub request_rate_secs: u64,
    /// Consecutive scan failures tolerated before the process shuts down.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    /// Fixed wait between two scan attempts.
    #[serde(default = "default_retry_wait")]
    pub retry_wait_secs: u64,
    /// A new scan session is considered healthy after this long without errors.
    #[serde(default = "default_session_confirm")]
    pub session_confirm_secs: u64,
    #[serde(default = "default_reddit_base_url")]
    pub base_url: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            request_rate_secs: default_request_rate(),
            max_retry_attempts: default_max_retry_attempts(),
            retry_wait_secs: default_retry_wait(),
            session_confirm_secs: default_session_confirm(),
            base_url: default_reddit_base_url(),
        }
    }
}

fn default_request_rate() -> u64 {
    5
}

fn default_max_retry_attempts() -> u32 {
    10
}

fn default_retry_wait() -> u64 {
    10
}

fn default_session_confirm() -> u64 {
    30
}

fn default_reddit_base_url() -> String {
    "https://www.reddit.com".to_string()
}

/// Spotify application credentials and endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Open the authorization page in a browser instead of only logging it.
    #[serde(default)]
    pub open_browser: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    /// Web API base URL (default: https://api.spotify.com/v1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// Accounts service base URL (default: https://accounts.spotify.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts_base_url: Option<String>,
    /// Pause between two playlist lookups at startup.
    #[serde(default = "default_setup_pause")]
    pub setup_pause_ms: u64,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            open_browser: false,
            redirect_uri: None,
            api_base_url: None,
            accounts_base_url: None,
            setup_pause_ms: default_setup_pause(),
        }
    }
}

fn default_setup_pause() -> u64 {
    1000
}

/// Per-item task fan-out
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DispatcherConfig {
    /// Maximum items resolved at the same time (0 = unlimited).
    #[serde(default)]
    pub max_concurrent_items: usize,
}

/// A destination playlist and the sources routed to it
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlaylistSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub subreddits: Vec<String>,
}

impl PlaylistSpec {
    /// Explicit playlist id, ignoring empty strings.
    pub fn playlist_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Playlist name, ignoring empty strings.
    pub fn playlist_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub reddit: RedditConfig,
    pub spotify: SanitizedSpotifyConfig,
    pub server: ServerConfig,
    pub dispatcher: DispatcherConfig,
    pub playlists: Vec<PlaylistSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSpotifyConfig {
    pub client_id: String,
    pub client_secret_configured: bool,
    pub open_browser: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            reddit: config.reddit.clone(),
            spotify: SanitizedSpotifyConfig {
                client_id: config.spotify.client_id.clone(),
                client_secret_configured: !config.spotify.client_secret.is_empty(),
                open_browser: config.spotify.open_browser,
            },
            server: config.server.clone(),
            dispatcher: config.dispatcher.clone(),
            playlists: config.playlists.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_playlists(playlists: Vec<PlaylistSpec>) -> Config {
        Config {
            reddit: RedditConfig {
                username: "someone".to_string(),
                ..Default::default()
            },
            spotify: SpotifyConfig::default(),
            server: ServerConfig::default(),
            dispatcher: DispatcherConfig::default(),
            playlists,
            verbose: false,
        }
    }

    #[test]
    fn test_subreddits_are_normalized_and_deduplicated() {
        let config = config_with_playlists(vec![
            PlaylistSpec {
                name: Some("Indie".to_string()),
                id: None,
                subreddits: vec!["r/IndieHeads".to_string(), "listentothis".to_string()],
            },
            PlaylistSpec {
                name: None,
                id: Some("abc".to_string()),
                subreddits: vec!["indieheads".to_string(), "Music".to_string()],
            },
        ]);

        assert_eq!(
            config.subreddits(),
            vec!["indieheads", "listentothis", "music"]
        );
    }

    #[test]
    fn test_user_agent_mentions_username() {
        let config = config_with_playlists(vec![]);
        let agent = config.user_agent();
        assert!(agent.contains(":dissic:"));
        assert!(agent.ends_with("(by /u/someone)"));
    }

    #[test]
    fn test_redirect_uri_defaults_to_local_listener() {
        let mut config = config_with_playlists(vec![]);
        config.server.port = 9090;
        assert_eq!(config.redirect_uri(), "http://localhost:9090/spotifyAuth");

        config.spotify.redirect_uri = Some("https://example.com/cb".to_string());
        assert_eq!(config.redirect_uri(), "https://example.com/cb");
    }

    #[test]
    fn test_sanitized_config_hides_secret() {
        let mut config = config_with_playlists(vec![]);
        config.spotify.client_secret = "hunter2".to_string();

        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(sanitized.spotify.client_secret_configured);
        assert!(!json.contains("hunter2"));
    }
}
