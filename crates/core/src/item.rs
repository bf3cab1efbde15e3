//! Ingested posts and source-name normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strip a leading `r/` and lower-case a source name.
pub fn normalize_source_name(name: &str) -> String {
    let trimmed = name.trim();
    let without_prefix = trimmed
        .strip_prefix("r/")
        .or_else(|| trimmed.strip_prefix("/r/"))
        .unwrap_or(trimmed);
    without_prefix.to_lowercase()
}

/// One ingested post.
///
/// Created by the scanner for every observed post and consumed exactly once
/// by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    /// Normalized source name (lower-case, no `r/` prefix).
    pub origin: String,
    pub post_title: String,
    pub media_title: Option<String>,
    pub secure_media_title: Option<String>,
    /// Link the post points to, if any.
    pub url: Option<String>,
    /// Reddit permalink, for log output.
    pub permalink: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl RawItem {
    pub fn new(origin: &str, post_title: impl Into<String>) -> Self {
        Self {
            origin: normalize_source_name(origin),
            post_title: post_title.into(),
            media_title: None,
            secure_media_title: None,
            url: None,
            permalink: None,
            created_at: None,
        }
    }

    pub fn with_media_title(mut self, title: impl Into<String>) -> Self {
        self.media_title = Some(title.into());
        self
    }

    pub fn with_secure_media_title(mut self, title: impl Into<String>) -> Self {
        self.secure_media_title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_permalink(mut self, permalink: impl Into<String>) -> Self {
        self.permalink = Some(permalink.into());
        self
    }

    /// Non-empty candidate titles in priority order: post title, media embed
    /// title, secure media embed title.
    pub fn candidate_titles(&self) -> Vec<&str> {
        [
            Some(self.post_title.as_str()),
            self.media_title.as_deref(),
            self.secure_media_title.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|title| !title.trim().is_empty())
        .collect()
    }

    /// Direct resource URL, ignoring empty strings.
    pub fn direct_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }
}
