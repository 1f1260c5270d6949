//! Show details from Jikan (MyAnimeList mirror).
//!
//! Synopses and thumbnails are looked up by title, written to the cache
//! folder and reused on later searches. Jikan allows a handful of requests
//! per second, so every lookup goes through a shared [`RateLimiter`].

use crate::api::{retry_with_backoff, USER_AGENT};
use crate::cache::ThumbnailCache;
use crate::error::{AppError, Result};
use crate::types::{Show, ShowDetails, NO_DESCRIPTION};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};

const JIKAN_SEARCH_URL: &str = "https://api.jikan.moe/v4/anime";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default spacing between Jikan requests (2 req/s).
pub const DEFAULT_DELAY_MS: u64 = 500;

/// Enforces a minimum interval between request starts.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until a request may start, then claim the slot.
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// Response types for anime search
#[derive(Debug, Deserialize)]
struct JikanSearchResponse {
    #[serde(default)]
    data: Vec<JikanAnime>,
}

#[derive(Debug, Deserialize)]
struct JikanAnime {
    #[serde(default)]
    synopsis: Option<String>,
    #[serde(default)]
    images: Option<JikanImages>,
}

#[derive(Debug, Deserialize)]
struct JikanImages {
    #[serde(default)]
    jpg: Option<JikanImage>,
}

#[derive(Debug, Deserialize)]
struct JikanImage {
    #[serde(default)]
    image_url: Option<String>,
}

/// The parts of a Jikan match ani-gui keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct JikanMatch {
    pub synopsis: String,
    pub image_url: String,
}

/// Extract the first match from a Jikan search body.
///
/// Returns `None` when there is no result or the result has no jpg image.
pub fn parse_jikan_search(body: &str) -> Result<Option<JikanMatch>> {
    let parsed: JikanSearchResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Parse(format!("Failed to parse Jikan response: {}", e)))?;

    let Some(first) = parsed.data.into_iter().next() else {
        return Ok(None);
    };

    let image_url = first
        .images
        .and_then(|images| images.jpg)
        .and_then(|jpg| jpg.image_url)
        .filter(|url| !url.is_empty());

    Ok(image_url.map(|image_url| JikanMatch {
        synopsis: first
            .synopsis
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        image_url,
    }))
}

/// Fetches and caches show details.
#[derive(Debug)]
pub struct MetadataClient {
    client: reqwest::Client,
    limiter: RateLimiter,
    cache: ThumbnailCache,
}

impl MetadataClient {
    pub fn new(cache: ThumbnailCache, delay: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            limiter: RateLimiter::new(delay),
            cache,
        })
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    /// Details for `title`, from the cache folder or the web.
    ///
    /// Never fails: errors are logged and the fallback details returned.
    pub async fn fetch_details(&self, title: &str) -> ShowDetails {
        match self.cache.load(title) {
            Ok(Some(details)) => return details,
            Ok(None) => {}
            Err(e) => warn!("Ignoring cache entry for '{}': {}", title, e),
        }

        match self.fetch_remote(title).await {
            Ok(Some(details)) => details,
            Ok(None) => {
                debug!("No Jikan match for '{}'", title);
                ShowDetails::fallback()
            }
            Err(e) => {
                warn!("Could not fetch details for '{}': {}", title, e);
                ShowDetails::fallback()
            }
        }
    }

    async fn fetch_remote(&self, title: &str) -> Result<Option<ShowDetails>> {
        let limiter = &self.limiter;
        // Every attempt, retries included, takes its own limiter slot.
        let body = retry_with_backoff(&format!("Jikan lookup for '{}'", title), || {
            let client = self.client.clone();
            let title = title.to_string();
            async move {
                limiter.acquire().await;
                client
                    .get(JIKAN_SEARCH_URL)
                    .query(&[("q", title.as_str()), ("limit", "1")])
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await
            }
        })
        .await?;

        let Some(found) = parse_jikan_search(&body)? else {
            return Ok(None);
        };

        self.cache.store_synopsis(title, &found.synopsis)?;

        let bytes = self
            .client
            .get(&found.image_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let path = self.cache.store_image(title, &bytes)?;

        debug!("Cached thumbnail for '{}' at {}", title, path.display());
        Ok(Some(ShowDetails {
            synopsis: found.synopsis,
            thumbnail: Some(path),
        }))
    }

    /// Fetch details for every show concurrently, keyed by show id.
    ///
    /// `progress` is called with `(done, total)` as lookups finish.
    pub async fn fetch_all<P>(
        self: &Arc<Self>,
        shows: &[Show],
        mut progress: P,
    ) -> HashMap<String, ShowDetails>
    where
        P: FnMut(usize, usize),
    {
        let total = shows.len();
        let mut set = JoinSet::new();

        for show in shows {
            let client = Arc::clone(self);
            let id = show.id.clone();
            let name = show.name.clone();
            set.spawn(async move {
                let details = client.fetch_details(&name).await;
                (id, details)
            });
        }

        let mut results = HashMap::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((id, details)) => {
                    results.insert(id, details);
                }
                Err(e) => warn!("Detail lookup task failed: {}", e),
            }
            progress(results.len(), total);
        }

        results
    }
}
