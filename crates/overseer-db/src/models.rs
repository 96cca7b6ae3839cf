//! Internal Rust models matching the database schema.

use chrono::{DateTime, Utc};
use overseer_common::{MediaId, MediaKind};
use serde::{Deserialize, Serialize};

/// A persisted request for one media item.
///
/// Once present, `approved` and `available` are the authoritative state for
/// the item; they may reflect manual overrides made by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestRecord {
    pub id: i64,
    pub media_id: MediaId,
    pub media_kind: MediaKind,
    pub title: String,
    pub imdb_id: Option<String>,
    pub approved: bool,
    pub available: bool,
    pub requested_at: DateTime<Utc>,
}

/// Insertable request row.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub media_id: MediaId,
    pub media_kind: MediaKind,
    pub title: String,
    pub imdb_id: Option<String>,
    pub approved: bool,
    pub available: bool,
}

impl NewRequest {
    /// A fresh, unapproved and unavailable request.
    pub fn new(media_id: MediaId, media_kind: MediaKind, title: impl Into<String>) -> Self {
        Self {
            media_id,
            media_kind,
            title: title.into(),
            imdb_id: None,
            approved: false,
            available: false,
        }
    }

    pub fn approved(mut self, approved: bool) -> Self {
        self.approved = approved;
        self
    }

    pub fn available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        self.imdb_id = Some(imdb_id.into());
        self
    }
}
