//! OAuth handshake with the catalog provider.
//!
//! [`SpotifyAuthenticator`] runs the authorization code flow, [`PendingAuth`]
//! bridges the HTTP callback and startup, and [`AuthSession`] keeps the access
//! token fresh for every catalog call.

mod handshake;
mod spotify;
mod traits;
mod types;

pub use handshake::PendingAuth;
pub use spotify::{AuthSession, SpotifyAuthenticator};
pub use traits::*;
pub use types::{CallbackParams, Token, REFRESH_MARGIN, SCOPES};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_source() {
        let source = StaticToken("abc".to_string());
        assert_eq!(source.access_token().await.unwrap(), "abc");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuthError::StateMismatch.to_string(),
            "Callback state does not match this session"
        );
        let err = AuthError::TokenEndpoint {
            status: 400,
            message: "invalid_grant".to_string(),
        };
        assert_eq!(err.to_string(), "Token endpoint error: 400 - invalid_grant");
    }
}
