//! Typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical identifier assigned to a media item by the metadata provider.
///
/// This is the join key between provider results, local request records and
/// media-server lookups. It is stable for the lifetime of the upstream item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(u64);

impl MediaId {
    /// Wrap a raw provider id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for MediaId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MediaId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}
