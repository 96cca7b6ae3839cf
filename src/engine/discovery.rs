//! Discovery selectors and duplicate handling for provider feeds.

use std::collections::HashSet;
use std::fmt;

use overseer_common::MediaId;

use crate::config::DuplicatePolicy;
use crate::metadata::{Category, MediaItem};

/// What to ask the metadata provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Free-text search.
    Search(String),
    /// One of the curated lists.
    Category(Category),
}

impl fmt::Display for Discovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(query) => write!(f, "search {query:?}"),
            Self::Category(category) => write!(f, "{category}"),
        }
    }
}

impl From<Category> for Discovery {
    fn from(category: Category) -> Self {
        Self::Category(category)
    }
}

impl DuplicatePolicy {
    /// Apply the policy to a provider feed, preserving order.
    pub fn apply(self, items: Vec<MediaItem>) -> Vec<MediaItem> {
        match self {
            DuplicatePolicy::KeepAll => items,
            DuplicatePolicy::FirstWins => {
                let mut seen = HashSet::with_capacity(items.len());
                items.into_iter().filter(|item| seen.insert(item.id)).collect()
            }
        }
    }

    /// Apply the policy to a list of ids, preserving order.
    pub fn apply_ids(self, ids: &[MediaId]) -> Vec<MediaId> {
        match self {
            DuplicatePolicy::KeepAll => ids.to_vec(),
            DuplicatePolicy::FirstWins => {
                let mut seen = HashSet::with_capacity(ids.len());
                ids.iter().copied().filter(|id| seen.insert(*id)).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> Vec<MediaItem> {
        vec![
            MediaItem::new(1, "A"),
            MediaItem::new(2, "B"),
            MediaItem::new(1, "A (again)"),
            MediaItem::new(3, "C"),
        ]
    }

    #[test]
    fn first_wins_keeps_first_position() {
        let titles: Vec<String> = DuplicatePolicy::FirstWins
            .apply(feed())
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, ["A", "B", "C"]);
    }

    #[test]
    fn keep_all_is_identity() {
        assert_eq!(DuplicatePolicy::KeepAll.apply(feed()), feed());
    }

    #[test]
    fn ids_dedupe() {
        let ids: Vec<MediaId> = [5, 4, 5, 6, 4].into_iter().map(MediaId::new).collect();
        let out: Vec<u64> = DuplicatePolicy::FirstWins
            .apply_ids(&ids)
            .into_iter()
            .map(MediaId::get)
            .collect();
        assert_eq!(out, [5, 4, 6]);
    }

    #[test]
    fn discovery_display() {
        assert_eq!(Discovery::Search("dune".into()).to_string(), "search \"dune\"");
        assert_eq!(Discovery::from(Category::NowPlaying).to_string(), "now_playing");
    }
}
