//! Spotify authorization code flow.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{Token, TokenResponse, SCOPES};
use super::{AccessTokenSource, AuthError};
use crate::config::Config;

const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Builds the authorization URL and trades codes for tokens.
pub struct SpotifyAuthenticator {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    accounts_url: String,
    state: String,
}

impl SpotifyAuthenticator {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        accounts_url: Option<String>,
    ) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            accounts_url: accounts_url
                .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            state: format!("dissic:{}", Uuid::new_v4()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        Self::new(
            config.spotify.client_id.clone(),
            config.spotify.client_secret.clone(),
            config.redirect_uri(),
            config.spotify.accounts_base_url.clone(),
        )
    }

    /// State value the callback must echo back.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// URL the user has to visit to grant access.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
            self.accounts_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&SCOPES.join(" ")),
            urlencoding::encode(&self.state),
        )
    }

    /// Exchange an authorization code for a token.
    pub async fn exchange_code(&self, code: &str) -> Result<Token, AuthError> {
        debug!("Exchanging authorization code");
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.redirect_uri),
            ])
            .await?;
        Ok(response.into_token(None))
    }

    /// Use a refresh token to get a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token, AuthError> {
        debug!("Refreshing access token");
        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;
        Ok(response.into_token(Some(refresh_token.to_string())))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ParseError(e.to_string()))
    }
}

/// An authenticated session that keeps its token fresh.
pub struct AuthSession {
    authenticator: Arc<SpotifyAuthenticator>,
    token: RwLock<Token>,
}

impl AuthSession {
    pub fn new(authenticator: Arc<SpotifyAuthenticator>, token: Token) -> Self {
        Self {
            authenticator,
            token: RwLock::new(token),
        }
    }
}

#[async_trait]
impl AccessTokenSource for AuthSession {
    async fn access_token(&self) -> Result<String, AuthError> {
        {
            let token = self.token.read().await;
            if !token.needs_refresh() {
                return Ok(token.access_token.clone());
            }
        }

        let mut token = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if !token.needs_refresh() {
            return Ok(token.access_token.clone());
        }

        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or(AuthError::NoRefreshToken)?;
        *token = self.authenticator.refresh(&refresh_token).await?;
        info!("Access token refreshed");

        Ok(token.access_token.clone())
    }
}
