//! The reconciliation engine.
//!
//! One batch is: fetch candidate items from the metadata provider, read the
//! request index and the probe settings once, then merge every item with its
//! request record and the first positive probe result. Output order always
//! matches the provider's order.
//!
//! Failure semantics are batch-level for the provider and the request index:
//! either fails, the whole batch fails and no partial output is returned.
//! A provider that reports itself unavailable fails the batch before any
//! collaborator is called. Probe failures never fail a batch; they degrade
//! to "not available".

mod annotate;
mod discovery;

pub use annotate::{annotate, AnnotatedMediaItem};
pub use discovery::Discovery;

pub use crate::config::DuplicatePolicy;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use overseer_common::{Error, MediaId, MediaKind, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::availability::{ProbeSet, ProbeSettings};
use crate::config::ReconcileConfig;
use crate::metadata::{Category, MediaItem, MetadataProvider};
use crate::requests::{RequestIndex, RequestStore};

/// Tunables for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub max_concurrent_probes: usize,
    pub max_concurrent_details: usize,
    pub probe_timeout: Duration,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&ReconcileConfig::default())
    }
}

impl From<&ReconcileConfig> for EngineOptions {
    fn from(config: &ReconcileConfig) -> Self {
        Self {
            max_concurrent_probes: config.max_concurrent_probes,
            max_concurrent_details: config.max_concurrent_details,
            probe_timeout: config.probe_timeout(),
            duplicate_policy: config.duplicate_policy,
        }
    }
}

/// Everything read once per batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSnapshot {
    pub kind: MediaKind,
    pub index: RequestIndex,
    pub settings: ProbeSettings,
}

/// Joins provider items against local requests and media-server libraries.
pub struct ReconciliationEngine {
    provider: Arc<dyn MetadataProvider>,
    requests: Arc<dyn RequestStore>,
    probes: ProbeSet,
    media_kind: MediaKind,
    options: EngineOptions,
}

impl ReconciliationEngine {
    /// Create an engine for movies with default options.
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        requests: Arc<dyn RequestStore>,
        probes: ProbeSet,
    ) -> Self {
        Self {
            provider,
            requests,
            probes,
            media_kind: MediaKind::Movie,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Media kind used by the discovery and detail entry points.
    pub fn with_media_kind(mut self, kind: MediaKind) -> Self {
        self.media_kind = kind;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    pub fn provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.provider
    }

    /// Read the request index for `kind` and the probe settings, once each.
    pub async fn snapshot(&self, kind: MediaKind) -> Result<BatchSnapshot> {
        let (index, settings) = tokio::join!(self.requests.request_index(kind), self.probes.settings());
        let index = index.map_err(Error::into_index_failure)?;

        debug!(
            kind = %kind,
            requests = index.len(),
            probes = ?settings.enabled_kinds(),
            "Captured batch snapshot"
        );

        Ok(BatchSnapshot {
            kind,
            index,
            settings,
        })
    }

    /// Annotate `items` in order.
    ///
    /// The output has exactly one entry per input item, at the same position.
    /// An empty batch returns immediately without touching any collaborator.
    pub async fn reconcile_batch(
        &self,
        items: Vec<MediaItem>,
        kind: MediaKind,
    ) -> Result<Vec<AnnotatedMediaItem>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = self.snapshot(kind).await?;
        Ok(self.reconcile_with(items, &snapshot).await)
    }

    /// Annotate a single item.
    pub async fn reconcile_single(
        &self,
        item: MediaItem,
        kind: MediaKind,
    ) -> Result<AnnotatedMediaItem> {
        self.reconcile_batch(vec![item], kind)
            .await?
            .pop()
            .ok_or_else(|| Error::internal("reconciliation produced no item"))
    }

    /// Annotate `items` against an already captured snapshot.
    pub async fn reconcile_with(
        &self,
        items: Vec<MediaItem>,
        snapshot: &BatchSnapshot,
    ) -> Vec<AnnotatedMediaItem> {
        let BatchSnapshot {
            kind,
            index,
            settings,
        } = snapshot;

        if !settings.any_enabled() {
            return items
                .into_iter()
                .map(|item| {
                    let record = index.get(item.id);
                    annotate(item, record, Default::default())
                })
                .collect();
        }

        let timeout = self.options.probe_timeout;
        stream::iter(items)
            .map(|item| async move {
                let availability = self.probes.lookup(settings, &item, *kind, timeout).await;
                let record = index.get(item.id);
                annotate(item, record, availability)
            })
            .buffered(self.options.max_concurrent_probes.max(1))
            .collect()
            .await
    }

    fn ensure_provider(&self) -> Result<()> {
        if self.provider.is_available() {
            return Ok(());
        }
        warn!(provider = self.provider.name(), "Metadata provider is not configured");
        Err(Error::provider_unavailable(format!(
            "{} is not configured",
            self.provider.name()
        )))
    }

    /// Fetch a provider feed and reconcile it.
    pub async fn discover(&self, discovery: &Discovery) -> Result<Vec<AnnotatedMediaItem>> {
        if let Discovery::Search(query) = discovery {
            if query.trim().is_empty() {
                return Err(Error::invalid_input("search query must not be empty"));
            }
        }
        self.ensure_provider()?;

        let fetch = async {
            let items = match discovery {
                Discovery::Search(query) => self.provider.search(query.trim()).await,
                Discovery::Category(category) => self.provider.category(*category).await,
            };
            items.map_err(Error::into_provider_failure)
        };

        let (items, snapshot) = tokio::try_join!(fetch, self.snapshot(self.media_kind))?;

        let fetched = items.len();
        let items = self.options.duplicate_policy.apply(items);
        if items.len() != fetched {
            debug!(dropped = fetched - items.len(), "Dropped duplicate provider items");
        }

        let annotated = self.reconcile_with(items, &snapshot).await;
        info!(
            provider = self.provider.name(),
            discovery = %discovery,
            count = annotated.len(),
            "Reconciled provider feed"
        );
        Ok(annotated)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<AnnotatedMediaItem>> {
        self.discover(&Discovery::Search(query.to_string())).await
    }

    pub async fn popular(&self) -> Result<Vec<AnnotatedMediaItem>> {
        self.discover(&Category::Popular.into()).await
    }

    pub async fn top_rated(&self) -> Result<Vec<AnnotatedMediaItem>> {
        self.discover(&Category::TopRated.into()).await
    }

    pub async fn upcoming(&self) -> Result<Vec<AnnotatedMediaItem>> {
        self.discover(&Category::Upcoming.into()).await
    }

    pub async fn now_playing(&self) -> Result<Vec<AnnotatedMediaItem>> {
        self.discover(&Category::NowPlaying.into()).await
    }

    /// Resolve bare ids to full items and reconcile them.
    ///
    /// Ids the provider does not know are skipped with a warning; the rest
    /// keep the order of `ids`.
    pub async fn lookup_details(&self, ids: &[MediaId]) -> Result<Vec<AnnotatedMediaItem>> {
        let ids = self.options.duplicate_policy.apply_ids(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_provider()?;

        let fetch = async {
            self.provider
                .details(&ids, self.options.max_concurrent_details)
                .await
                .map_err(Error::into_provider_failure)
        };

        let (details, snapshot) = tokio::try_join!(fetch, self.snapshot(self.media_kind))?;

        let items: Vec<MediaItem> = ids
            .iter()
            .zip(details)
            .filter_map(|(id, detail)| {
                if detail.is_none() {
                    warn!(id = %id, provider = self.provider.name(), "Skipping unknown media id");
                }
                detail
            })
            .collect();

        let annotated = self.reconcile_with(items, &snapshot).await;
        info!(requested = ids.len(), count = annotated.len(), "Reconciled detail lookup");
        Ok(annotated)
    }
}

/// Run `fut` until it completes or `token` is cancelled.
///
/// Cancellation drops `fut`, aborting whatever it had in flight, and yields
/// [`Error::Cancelled`].
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}
