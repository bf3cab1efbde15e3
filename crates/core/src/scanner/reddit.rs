//! Reddit listing poller.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::Config;
use crate::item::RawItem;

use super::traits::{ItemSink, ScanSession, Scanner};
use super::ScanError;

const LISTING_LIMIT: u32 = 100;
const SEEN_CAPACITY: usize = 2_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded set of post IDs already handled.
#[derive(Debug)]
struct SeenPosts {
    ids: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
    primed: bool,
}

impl SeenPosts {
    fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity,
            primed: false,
        }
    }

    /// Returns true if `id` was not seen before.
    fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string());
        self.order.push_back(id.to_string());
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        true
    }
}

/// Polls `<base>/r/<a+b>/new.json` for new posts.
///
/// The first successful poll only records what is already there. The
/// seen set outlives sessions, so a restarted session picks up posts made
/// while the previous one was down.
pub struct RedditScanner {
    client: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    seen: Arc<Mutex<SeenPosts>>,
}

impl RedditScanner {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        poll_interval: Duration,
    ) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval,
            seen: Arc::new(Mutex::new(SeenPosts::new(SEEN_CAPACITY))),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ScanError> {
        Self::new(
            config.reddit.base_url.clone(),
            &config.user_agent(),
            Duration::from_secs(config.reddit.request_rate_secs),
        )
    }
}

#[async_trait]
impl Scanner for RedditScanner {
    async fn scan(&self, sources: &[String], sink: ItemSink) -> Result<ScanSession, ScanError> {
        if sources.is_empty() {
            return Err(ScanError::Connection("no sources to watch".to_string()));
        }

        let poller = Poller {
            client: self.client.clone(),
            listing_url: format!(
                "{}/r/{}/new.json?limit={}&raw_json=1",
                self.base_url,
                sources.join("+"),
                LISTING_LIMIT
            ),
            base_url: self.base_url.clone(),
            poll_interval: self.poll_interval,
            seen: self.seen.clone(),
        };

        let stop = CancellationToken::new();
        let token = stop.clone();
        Ok(ScanSession::spawn(stop, async move {
            poller.run(token, sink).await
        }))
    }
}

struct Poller {
    client: reqwest::Client,
    listing_url: String,
    base_url: String,
    poll_interval: Duration,
    seen: Arc<Mutex<SeenPosts>>,
}

impl Poller {
    async fn run(self, stop: CancellationToken, sink: ItemSink) -> Result<(), ScanError> {
        debug!(url = %self.listing_url, "Polling listing");

        loop {
            let listing = tokio::select! {
                _ = stop.cancelled() => return Ok(()),
                listing = self.fetch() => listing?,
            };

            for item in self.new_items(listing) {
                sink(item);
            }

            tokio::select! {
                _ = stop.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    async fn fetch(&self) -> Result<Listing, ScanError> {
        let response = self.client.get(&self.listing_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ScanError::Parse(e.to_string()))
    }

    fn new_items(&self, listing: Listing) -> Vec<RawItem> {
        let mut seen = match self.seen.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        let priming = !seen.primed;
        seen.primed = true;

        // listings are newest first
        let mut items = Vec::new();
        for child in listing.data.children.into_iter().rev() {
            let post = child.data;
            if !seen.insert(&post.name) || priming {
                continue;
            }
            trace!(id = %post.name, title = %post.title, "New post");
            items.push(post.into_item(&self.base_url));
        }

        if priming {
            debug!(posts = seen.order.len(), "Primed with existing posts");
        }
        items
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    /// Fullname, e.g. `t3_abc123`.
    name: String,
    subreddit: String,
    title: String,
    url: Option<String>,
    permalink: Option<String>,
    created_utc: Option<f64>,
    media: Option<Media>,
    secure_media: Option<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    oembed: Option<OEmbed>,
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    title: Option<String>,
}

impl Media {
    fn title(self) -> Option<String> {
        self.oembed.and_then(|o| o.title)
    }
}

impl Post {
    fn into_item(self, base_url: &str) -> RawItem {
        let mut item = RawItem::new(&self.subreddit, self.title);
        item.media_title = self.media.and_then(Media::title);
        item.secure_media_title = self.secure_media.and_then(Media::title);
        item.url = self.url;
        item.permalink = self.permalink.map(|p| format!("{}{}", base_url, p));
        item.created_at = self
            .created_utc
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts as i64, 0));
        item
    }
}
