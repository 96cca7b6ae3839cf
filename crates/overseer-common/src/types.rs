//! Core type definitions.
//!
//! Enums are serialized in lowercase so they can be stored verbatim in the
//! request database and round-tripped through configuration files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of media a request record refers to.
///
/// Request records are partitioned by kind: a movie and a TV show may share
/// the same provider id without colliding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A feature film.
    #[default]
    Movie,
    /// A TV series.
    Tv,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Tv => write!(f, "tv"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(Self::Movie),
            "tv" | "tvshow" | "tvshows" | "series" => Ok(Self::Tv),
            other => Err(crate::Error::invalid_input(format!(
                "unknown media kind: {other}"
            ))),
        }
    }
}
