use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

/// Scopes dissic needs to read and modify the user's playlists.
pub const SCOPES: [&str; 3] = [
    "playlist-read-private",
    "playlist-modify-private",
    "playlist-modify-public",
];

/// Tokens are refreshed this long before they actually expire.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Query parameters of the OAuth redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// An access token and what is needed to renew it.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Instant,
}

impl Token {
    /// True when the token is expired or about to be.
    pub fn needs_refresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN >= self.expires_at
    }
}

/// Raw token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

impl TokenResponse {
    /// Convert into a [`Token`], keeping `previous_refresh` when the provider
    /// did not rotate the refresh token.
    pub(crate) fn into_token(self, previous_refresh: Option<String>) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: Instant::now() + Duration::from_secs(self.expires_in),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_needs_refresh_near_expiry() {
        let fresh = Token {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(!fresh.needs_refresh());

        let stale = Token {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(stale.needs_refresh());
    }

    #[test]
    fn test_token_response_keeps_previous_refresh_token() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"new","expires_in":3600}"#).unwrap();
        let token = response.into_token(Some("old-refresh".to_string()));

        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
    }

    #[test]
    fn test_callback_params_deserialize() {
        let params: CallbackParams =
            serde_json::from_str(r#"{"code":"abc","state":"dissic:1"}"#).unwrap();
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.state.as_deref(), Some("dissic:1"));
        assert!(params.error.is_none());
    }
}
