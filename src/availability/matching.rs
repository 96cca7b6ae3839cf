//! Matching library entries on a media server against provider items.
//!
//! An IMDb id on both sides decides the match outright. Otherwise titles must
//! agree after normalisation and, when both sides know it, so must the year.

use crate::metadata::MediaItem;

/// One library entry as reported by a media server.
#[derive(Debug, Clone, Copy)]
pub struct LibraryEntry<'a> {
    pub title: &'a str,
    pub year: Option<u16>,
    pub imdb_id: Option<&'a str>,
}

pub fn is_match(item: &MediaItem, entry: &LibraryEntry<'_>) -> bool {
    if let (Some(wanted), Some(found)) = (item.imdb_id.as_deref(), entry.imdb_id) {
        return wanted.eq_ignore_ascii_case(found.trim());
    }

    if normalize_title(&item.title) != normalize_title(entry.title) {
        return false;
    }

    match (item.release_year, entry.year) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Lowercase, drop punctuation and collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pull an IMDb id out of a server guid such as `imdb://tt0133093` or
/// `com.plexapp.agents.imdb://tt0133093?lang=en`.
pub fn imdb_from_guid(guid: &str) -> Option<&str> {
    let start = guid.find("tt")?;
    let rest = &guid[start..];
    let end = rest
        .char_indices()
        .skip(2)
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    (end > 2 && guid.contains("imdb")).then(|| &rest[..end])
}
