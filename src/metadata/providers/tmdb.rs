//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MetadataProvider`] for movies by querying the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - 30-second request timeout.
//! - Unknown ids (HTTP 404) surface as [`Error::NotFound`].

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use overseer_common::{Error, MediaId, Result};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::TmdbConfig;
use crate::metadata::provider::{Category, MediaItem, MetadataProvider};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbListResponse {
    #[serde(default)]
    results: Option<Vec<TmdbMovieSummary>>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieSummary {
    id: u64,
    title: Option<String>,
    original_title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetail {
    id: u64,
    title: Option<String>,
    original_title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    popularity: Option<f64>,
    imdb_id: Option<String>,
}

impl From<TmdbMovieSummary> for MediaItem {
    fn from(r: TmdbMovieSummary) -> Self {
        MediaItem {
            id: MediaId::new(r.id),
            title: r.title.unwrap_or_default(),
            original_title: r.original_title,
            release_year: parse_year(&r.release_date),
            release_date: non_empty(r.release_date),
            imdb_id: None,
            overview: r.overview,
            poster_url: r.poster_path.map(|p| image_url(&p)),
            vote_average: r.vote_average,
            popularity: r.popularity,
        }
    }
}

impl From<TmdbMovieDetail> for MediaItem {
    fn from(d: TmdbMovieDetail) -> Self {
        MediaItem {
            id: MediaId::new(d.id),
            title: d.title.unwrap_or_default(),
            original_title: d.original_title,
            release_year: parse_year(&d.release_date),
            release_date: non_empty(d.release_date),
            imdb_id: non_empty(d.imdb_id),
            overview: d.overview,
            poster_url: d.poster_path.map(|p| image_url(&p)),
            vote_average: d.vote_average,
            popularity: d.popularity,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB metadata provider.
///
/// # Examples
///
/// ```no_run
/// use overseer::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new("your-api-key".into(), "en-US".into());
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbProvider {
    /// Create a new TMDB provider with the given API key and language.
    ///
    /// The `language` parameter should be an ISO-639-1 language tag such as
    /// `"en-US"`. Rate limiting is configured at 4 requests per second.
    pub fn new(api_key: String, language: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });

        let quota = Quota::per_second(NonZeroU32::MIN.saturating_add(3));

        Self {
            client,
            base_url: TMDB_BASE_URL.to_string(),
            api_key,
            language,
            rate_limiter: RateLimiter::direct(quota),
        }
    }

    pub fn from_config(config: &TmdbConfig) -> Self {
        let provider = Self::new(config.api_key.clone(), config.language.clone());
        match &config.base_url {
            Some(base) => provider.with_base_url(base),
            None => provider,
        }
    }

    /// Point the provider at a different API root.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    ///
    /// The response status is not checked beyond 429.
    async fn get(&self, url: &Url) -> anyhow::Result<reqwest::Response> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(reqwest::Error::without_url)
                .with_context(|| format!("TMDB request failed: {}", url.path()))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "TMDB returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            return Ok(resp);
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url, what: &str) -> anyhow::Result<T> {
        let resp = self.get(url).await?;
        decode(resp, what).await
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> anyhow::Result<Url> {
        let params = [("api_key", self.api_key.as_str()), ("language", self.language.as_str())];
        Url::parse_with_params(
            &format!("{}{path}", self.base_url),
            params.iter().chain(extra_params.iter()),
        )
        .with_context(|| format!("invalid TMDB url for {path}"))
    }

    async fn list(&self, path: &str, extra_params: &[(&str, &str)], what: &str) -> Result<Vec<MediaItem>> {
        let url = self.url(path, extra_params).map_err(provider_error)?;
        debug!(path, "TMDB {}", what);

        let body: TmdbListResponse = self.get_json(&url, what).await.map_err(provider_error)?;

        Ok(body
            .results
            .unwrap_or_default()
            .into_iter()
            .map(MediaItem::from)
            .collect())
    }
}

/// Decode a successful response body.
///
/// Request URLs carry the API key, so they are stripped from every error.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response, what: &str) -> anyhow::Result<T> {
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("TMDB {what} returned {status}");
    }
    resp.json()
        .await
        .map_err(reqwest::Error::without_url)
        .with_context(|| format!("failed to parse TMDB {what} response"))
}

fn provider_error(e: anyhow::Error) -> Error {
    Error::provider_unavailable(format!("{e:#}"))
}

fn category_path(category: Category) -> &'static str {
    match category {
        Category::Popular => "/movie/popular",
        Category::TopRated => "/movie/top_rated",
        Category::Upcoming => "/movie/upcoming",
        Category::NowPlaying => "/movie/now_playing",
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: &Option<String>) -> Option<u16> {
    date.as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<u16>().ok())
}

/// Convert a TMDB image path fragment to a full URL.
fn image_url(path: &str) -> String {
    format!("{TMDB_IMAGE_BASE}{path}")
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        self.list("/search/movie", &[("query", query)], "movie search")
            .await
    }

    async fn category(&self, category: Category) -> Result<Vec<MediaItem>> {
        self.list(category_path(category), &[], &format!("{category} movies"))
            .await
    }

    async fn detail(&self, id: MediaId) -> Result<MediaItem> {
        let url = self
            .url(&format!("/movie/{id}"), &[("append_to_response", "videos")])
            .map_err(provider_error)?;
        debug!(id = %id, "TMDB get movie detail");

        let resp = self.get(&url).await.map_err(provider_error)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found("movie", id));
        }

        let detail: TmdbMovieDetail = decode(resp, "movie detail")
            .await
            .map_err(provider_error)?;

        Ok(detail.into())
    }
}
