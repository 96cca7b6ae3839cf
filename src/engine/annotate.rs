//! The per-item merge.

use serde::Serialize;
use url::Url;

use crate::availability::Availability;
use crate::metadata::MediaItem;
use crate::requests::RequestRecord;

/// A provider item annotated with local request state and library
/// availability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedMediaItem {
    #[serde(flatten)]
    pub item: MediaItem,
    /// A local request record exists for this item.
    pub requested: bool,
    pub approved: bool,
    pub available: bool,
    pub availability_link: Option<Url>,
}

/// Merge one item with its request record and probe result.
///
/// A request record, when present, is authoritative for `approved` and
/// `available`; the probe result then only contributes the link. Without a
/// record the item is unapproved and availability comes from the probes.
pub fn annotate(
    item: MediaItem,
    record: Option<&RequestRecord>,
    availability: Availability,
) -> AnnotatedMediaItem {
    let (requested, approved, available) = match record {
        Some(record) => (true, record.approved, record.available),
        None => (false, false, availability.available),
    };

    AnnotatedMediaItem {
        item,
        requested,
        approved,
        available,
        availability_link: availability.link,
    }
}
