//! Media-server availability probes.
//!
//! Each supported server kind contributes one [`AvailabilityProbe`]. Probes
//! are settings-gated: the engine reads every probe's [`ServerSettings`]
//! once per batch into a [`ProbeSettings`] snapshot and never calls
//! [`AvailabilityProbe::lookup`] on a disabled probe. Lookups receive the
//! snapshotted url and token, so a settings change made mid-batch only takes
//! effect on the next batch.
//!
//! Probes are consulted in registration order; the first one reporting the
//! item as available wins and supplies the link.

pub mod emby;
pub mod matching;
pub mod plex;

pub use emby::EmbyProbe;
pub use plex::PlexProbe;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use overseer_common::{Error, MediaKind, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::metadata::MediaItem;

/// Kind of media server an availability probe talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    Plex,
    Emby,
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plex => write!(f, "plex"),
            Self::Emby => write!(f, "emby"),
        }
    }
}

/// Result of one probe lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
    /// Where the item can be opened on the server, when known.
    pub link: Option<Url>,
}

impl Availability {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn available(link: Option<Url>) -> Self {
        Self {
            available: true,
            link,
        }
    }
}

/// Connection settings for one media server, as captured for a batch.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ServerSettings {
    pub enabled: bool,
    pub url: String,
    pub token: String,
}

impl ServerSettings {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Base url without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSettings")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// Settings-gated availability check against one media-server kind.
#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    fn kind(&self) -> ServerKind;

    /// Read the current settings for this server.
    async fn settings(&self) -> Result<ServerSettings>;

    /// Check whether `item` of the given `kind` is already present on the
    /// server described by `settings`.
    async fn lookup(
        &self,
        settings: &ServerSettings,
        item: &MediaItem,
        kind: MediaKind,
    ) -> Result<Availability>;
}

/// A probe that is always disabled.
///
/// Stands in for server kinds that are structurally supported but have no
/// working integration.
#[derive(Debug, Clone, Copy)]
pub struct InertProbe {
    kind: ServerKind,
}

impl InertProbe {
    pub fn new(kind: ServerKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl AvailabilityProbe for InertProbe {
    fn kind(&self) -> ServerKind {
        self.kind
    }

    async fn settings(&self) -> Result<ServerSettings> {
        Ok(ServerSettings::disabled())
    }

    async fn lookup(
        &self,
        _settings: &ServerSettings,
        _item: &MediaItem,
        _kind: MediaKind,
    ) -> Result<Availability> {
        Ok(Availability::unavailable())
    }
}

// ---------------------------------------------------------------------------
// Probe sets
// ---------------------------------------------------------------------------

/// Per-batch snapshot of every probe's settings.
///
/// Entries line up with the [`ProbeSet`] that produced the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSettings {
    entries: Vec<(ServerKind, ServerSettings)>,
}

impl ProbeSettings {
    pub fn is_enabled(&self, kind: ServerKind) -> bool {
        self.entries.iter().any(|(k, s)| *k == kind && s.enabled)
    }

    pub fn any_enabled(&self) -> bool {
        self.entries.iter().any(|(_, s)| s.enabled)
    }

    pub fn enabled_kinds(&self) -> Vec<ServerKind> {
        self.entries
            .iter()
            .filter(|(_, s)| s.enabled)
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Captured settings for `kind`, if a probe of that kind is registered.
    pub fn get(&self, kind: ServerKind) -> Option<&ServerSettings> {
        self.entries.iter().find(|(k, _)| *k == kind).map(|(_, s)| s)
    }
}

/// Ordered collection of probes; earlier probes take priority.
#[derive(Clone, Default)]
pub struct ProbeSet {
    probes: Vec<Arc<dyn AvailabilityProbe>>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a probe at the lowest priority so far.
    pub fn register(&mut self, probe: Arc<dyn AvailabilityProbe>) {
        self.probes.push(probe);
    }

    pub fn with(mut self, probe: Arc<dyn AvailabilityProbe>) -> Self {
        self.register(probe);
        self
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Read every probe's settings, once each and concurrently.
    ///
    /// A probe whose settings cannot be read is treated as disabled.
    pub async fn settings(&self) -> ProbeSettings {
        let read = join_all(self.probes.iter().map(|p| p.settings())).await;

        let entries = self
            .probes
            .iter()
            .zip(read)
            .map(|(probe, settings)| {
                let settings = settings.unwrap_or_else(|e| {
                    warn!(server = %probe.kind(), error = %e, "Failed to read probe settings; treating as disabled");
                    ServerSettings::disabled()
                });
                (probe.kind(), settings)
            })
            .collect();

        ProbeSettings { entries }
    }

    /// Run the enabled probes against `item` in priority order.
    ///
    /// Stops at the first probe reporting the item available. A probe that
    /// errors or exceeds `timeout` counts as "not available" for its server
    /// kind and the next probe is tried.
    pub async fn lookup(
        &self,
        settings: &ProbeSettings,
        item: &MediaItem,
        media_kind: MediaKind,
        timeout: Duration,
    ) -> Availability {
        for (probe, (kind, server)) in self.probes.iter().zip(&settings.entries) {
            let kind = *kind;
            if !server.enabled {
                continue;
            }

            let lookup = probe.lookup(server, item, media_kind);
            let outcome = match tokio::time::timeout(timeout, lookup).await {
                Ok(result) => result,
                Err(_) => Err(Error::probe_failure(kind, format!("timed out after {timeout:?}"))),
            };

            match outcome {
                Ok(availability) if availability.available => {
                    debug!(server = %kind, id = %item.id, "Item available on media server");
                    return availability;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(server = %kind, id = %item.id, error = %e, "Availability probe failed");
                }
            }
        }

        Availability::unavailable()
    }
}

impl fmt::Debug for ProbeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.probes.iter().map(|p| p.kind()))
            .finish()
    }
}
