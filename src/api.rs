//! API client for the AllAnime catalogue.
//!
//! This module provides functions for searching shows and fetching episode
//! lists from the AllAnime GraphQL API, the same catalogue ani-cli uses, so
//! result positions line up with ani-cli's `-S` selection.

use crate::error::{AppError, Result};
use crate::types::{sort_episodes, Episode, Mode, RawShow, Show};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Maximum number of retry attempts for failed requests.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds (doubles each retry).
const BASE_RETRY_DELAY_MS: u64 = 500;

const API_URL: &str = "https://api.allanime.day/api";
const API_REFERER: &str = "https://allmanga.to";
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0";

const SEARCH_QUERY: &str = r#"query ($search: SearchInput, $limit: Int, $page: Int, $translationType: VaildTranslationTypeEnumType, $countryOrigin: VaildCountryOriginEnumType) {
    shows(search: $search, limit: $limit, page: $page, translationType: $translationType, countryOrigin: $countryOrigin) {
        edges { _id name availableEpisodes __typename }
    }
}"#;

const EPISODES_QUERY: &str = r#"query ($showId: String!) {
    show(_id: $showId) {
        _id
        availableEpisodesDetail
    }
}"#;

/// Check if an error is retryable (network errors, timeouts, server errors, throttling).
pub(crate) fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout()
        || error.is_connect()
        || error.is_request()
        || error
            .status()
            .map(|s| s.is_server_error() || s == reqwest::StatusCode::TOO_MANY_REQUESTS)
            .unwrap_or(false)
}

/// Retry an async operation with exponential backoff.
///
/// Retries the operation up to `MAX_RETRIES` times on retryable errors,
/// with exponential backoff starting at `BASE_RETRY_DELAY_MS`.
pub(crate) async fn retry_with_backoff<T, F, Fut>(operation_name: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, reqwest::Error>>,
{
    let mut last_error = None;

    for attempt in 0..=MAX_RETRIES {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        "{} succeeded after {} attempts",
                        operation_name,
                        attempt + 1
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt < MAX_RETRIES && is_retryable_error(&e) {
                    let delay = Duration::from_millis(BASE_RETRY_DELAY_MS * 2_u64.pow(attempt));
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation_name,
                        attempt + 1,
                        MAX_RETRIES + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    last_error = Some(e);
                } else {
                    return Err(AppError::Network(format!("{} failed: {}", operation_name, e)));
                }
            }
        }
    }

    Err(AppError::Network(format!(
        "{} failed after {} attempts: {}",
        operation_name,
        MAX_RETRIES + 1,
        last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string())
    )))
}

// Response types for shows search
#[derive(Debug, Deserialize)]
struct ShowsResponse {
    data: ShowsData,
}

#[derive(Debug, Deserialize)]
struct ShowsData {
    shows: ShowsEdges,
}

#[derive(Debug, Deserialize)]
struct ShowsEdges {
    edges: Vec<RawShow>,
}

// Response types for episodes
#[derive(Debug, Deserialize)]
struct EpisodeResponse {
    data: EpisodeData,
}

#[derive(Debug, Deserialize)]
struct EpisodeData {
    show: EpisodeShow,
}

#[derive(Debug, Deserialize)]
struct EpisodeShow {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "availableEpisodesDetail", default)]
    available_episodes_detail: HashMap<String, Vec<String>>,
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// GET a GraphQL query against the AllAnime API and return the raw body.
async fn graphql_get(operation: &str, variables: serde_json::Value, query: &str) -> Result<String> {
    let client = http_client(Duration::from_secs(30))?;
    let variables_str = serde_json::to_string(&variables)?;
    let query_string = query.to_string();

    let resp = retry_with_backoff(operation, || {
        let client = client.clone();
        let variables_str = variables_str.clone();
        let query_string = query_string.clone();
        async move {
            client
                .get(API_URL)
                .header("Referer", API_REFERER)
                .query(&[("variables", variables_str), ("query", query_string)])
                .send()
                .await?
                .error_for_status()
        }
    })
    .await?;

    Ok(resp.text().await?)
}

/// Turn a search response body into shows for `mode`.
///
/// Shows keep their response order; `index` is the 1-based position.
pub fn parse_search_response(body: &str, mode: Mode) -> Result<Vec<Show>> {
    let parsed: ShowsResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Parse(format!("Failed to parse search results: {}", e)))?;

    Ok(parsed
        .data
        .shows
        .edges
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let count = raw.available_episodes.get(mode.as_str()).copied().unwrap_or(0);
            Show {
                id: raw.id,
                name: raw.name,
                index: i + 1,
                available_episodes: count,
            }
        })
        .collect())
}

/// Turn an episode list response body into sorted episodes for `mode`.
pub fn parse_episodes_response(body: &str, mode: Mode) -> Result<Vec<Episode>> {
    let parsed: EpisodeResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Parse(format!("Failed to parse episode list: {}", e)))?;

    let show_id = parsed.data.show.id;
    let mut episodes: Vec<Episode> = parsed
        .data
        .show
        .available_episodes_detail
        .get(mode.as_str())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|number| Episode {
            id: format!("{}-{}", show_id, number),
            number,
        })
        .collect();

    sort_episodes(&mut episodes);
    Ok(episodes)
}

/// Search for anime shows by query.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> ani_gui::error::Result<()> {
/// use ani_gui::types::Mode;
///
/// let shows = ani_gui::api::search_shows("solo leveling", Mode::Sub).await?;
/// for show in shows {
///     println!("{}", show.to_display());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search_shows(query: &str, mode: Mode) -> Result<Vec<Show>> {
    debug!("Searching for '{}' in {} mode", query, mode);

    let variables = serde_json::json!({
        "search": {
            "allowAdult": false,
            "allowUnknown": false,
            "query": query
        },
        "limit": 40,
        "page": 1,
        "translationType": mode.as_str(),
        "countryOrigin": "ALL"
    });

    let body = graphql_get(&format!("Search for '{}'", query), variables, SEARCH_QUERY).await?;
    let shows = parse_search_response(&body, mode)?;

    debug!("Found {} shows for query '{}'", shows.len(), query);
    Ok(shows)
}

/// Fetch available episodes for a show, sorted numerically.
pub async fn fetch_episodes(show_id: &str, mode: Mode) -> Result<Vec<Episode>> {
    debug!("Fetching episodes for show {} in {} mode", show_id, mode);

    let variables = serde_json::json!({
        "showId": show_id,
    });

    let body = graphql_get("Fetch episodes", variables, EPISODES_QUERY).await?;
    let episodes = parse_episodes_response(&body, mode)?;

    debug!("Found {} episodes for show {}", episodes.len(), show_id);
    Ok(episodes)
}
