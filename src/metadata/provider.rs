//! Trait definition and types for metadata providers.
//!
//! This module defines the [`MetadataProvider`] trait that the discovery
//! backend (TMDB, etc.) implements, along with the [`MediaItem`] snapshot it
//! returns.

use std::fmt;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use overseer_common::{MediaId, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Media items
// ---------------------------------------------------------------------------

/// Immutable snapshot of one media item as reported by the provider.
///
/// Produced fresh for every call; the caller owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Provider-assigned canonical id.
    pub id: MediaId,
    /// Localised display title.
    pub title: String,
    /// Original-language title, if different from `title`.
    pub original_title: Option<String>,
    /// Release date as an ISO-8601 string (YYYY-MM-DD).
    pub release_date: Option<String>,
    /// Year extracted from `release_date`.
    pub release_year: Option<u16>,
    /// IMDb identifier (`tt...`). Search and list results usually omit it;
    /// detail lookups fill it in.
    pub imdb_id: Option<String>,
    /// Synopsis / overview text.
    pub overview: Option<String>,
    /// Fully-qualified poster URL.
    pub poster_url: Option<String>,
    /// Community vote average (0.0 - 10.0).
    pub vote_average: Option<f64>,
    /// Provider popularity score.
    pub popularity: Option<f64>,
}

impl MediaItem {
    /// A bare item carrying only an id and a title.
    pub fn new(id: impl Into<MediaId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            original_title: None,
            release_date: None,
            release_year: None,
            imdb_id: None,
            overview: None,
            poster_url: None,
            vote_average: None,
            popularity: None,
        }
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        self.imdb_id = Some(imdb_id.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Curated lists
// ---------------------------------------------------------------------------

/// Curated list selector offered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Popular,
        Category::TopRated,
        Category::Upcoming,
        Category::NowPlaying,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Popular => write!(f, "popular"),
            Self::TopRated => write!(f, "top_rated"),
            Self::Upcoming => write!(f, "upcoming"),
            Self::NowPlaying => write!(f, "now_playing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async trait that metadata providers implement.
///
/// Every list-returning method preserves the provider's ordering. A "no data"
/// response is an empty `Vec`, not an error.
///
/// Errors should be [`Error::ProviderUnavailable`](overseer_common::Error)
/// for transport/upstream failures and
/// [`Error::NotFound`](overseer_common::Error) when a detail id is unknown.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the provider has been configured with valid
    /// credentials and is ready to serve requests.
    fn is_available(&self) -> bool;

    /// Free-text search.
    async fn search(&self, query: &str) -> Result<Vec<MediaItem>>;

    /// Fetch one of the curated lists.
    async fn category(&self, category: Category) -> Result<Vec<MediaItem>>;

    /// Fetch full details for one item.
    async fn detail(&self, id: MediaId) -> Result<MediaItem>;

    /// Fetch full details for many items, preserving `ids` order.
    ///
    /// Unknown ids come back as `None`; any other failure fails the whole
    /// call. The default issues single [`detail`](Self::detail) calls with
    /// at most `concurrency` in flight. Providers with a bulk endpoint should
    /// override this.
    async fn details(&self, ids: &[MediaId], concurrency: usize) -> Result<Vec<Option<MediaItem>>> {
        stream::iter(ids.iter().copied())
            .map(|id| async move {
                match self.detail(id).await {
                    Ok(item) => Ok(Some(item)),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }
}
