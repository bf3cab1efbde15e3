use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization denied: {0}")]
    Denied(String),

    #[error("Callback is missing the authorization code")]
    MissingCode,

    #[error("Callback state does not match this session")]
    StateMismatch,

    #[error("Authentication already completed")]
    AlreadyCompleted,

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Token endpoint error: {status} - {message}")]
    TokenEndpoint { status: u16, message: String },

    #[error("Failed to parse token response: {0}")]
    ParseError(String),
}

/// Something that can hand out a currently valid bearer token.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// A fixed token, for tests and short-lived tools.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}
