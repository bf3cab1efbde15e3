use super::{types::Config, ConfigError};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.reddit.username.is_empty() {
        return Err(invalid("reddit username is missing"));
    }

    if config.reddit.request_rate_secs < 2 {
        return Err(invalid("reddit request rate must be 2 or higher"));
    }

    if config.reddit.max_retry_attempts == 0 {
        return Err(invalid("reddit max retry attempts must be at least 1"));
    }

    if config.spotify.client_id.is_empty() {
        return Err(invalid("spotify client id is missing"));
    }

    if config.spotify.client_secret.is_empty() {
        return Err(invalid("spotify client secret is missing"));
    }

    for (i, playlist) in config.playlists.iter().enumerate() {
        if playlist.playlist_id().is_none() && playlist.playlist_name().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "playlist number {} is missing ID or name",
                i
            )));
        }
    }

    if config.subreddits().is_empty() {
        return Err(invalid("no subreddits configured"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
