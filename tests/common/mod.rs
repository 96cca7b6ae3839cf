//! Shared test harness for integration tests.
//!
//! Provides stub collaborators with call counters and optional random
//! latency, and [`TestHarness`] which wires them into a
//! [`ReconciliationEngine`].

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use url::Url;

use overseer::availability::{Availability, AvailabilityProbe, ProbeSet, ServerKind, ServerSettings};
use overseer::engine::{EngineOptions, ReconciliationEngine};
use overseer::metadata::{Category, MediaItem, MetadataProvider};
use overseer::requests::{RequestIndex, RequestRecord, RequestStore};
use overseer_common::{Error, MediaId, MediaKind, Result};

/// Sleep for a random duration in `min_ms..=max_ms` milliseconds.
async fn jitter(min_ms: u64, max_ms: u64) {
    let max_ms = max_ms.max(min_ms);
    if max_ms == 0 {
        return;
    }
    let ms = rand::thread_rng().gen_range(min_ms..=max_ms);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Bare movie items `(id, title)`.
pub fn items(pairs: &[(u64, &str)]) -> Vec<MediaItem> {
    pairs.iter().map(|&(id, title)| MediaItem::new(id, title)).collect()
}

pub fn ids(items: &[overseer::engine::AnnotatedMediaItem]) -> Vec<u64> {
    items.iter().map(|a| a.item.id.get()).collect()
}

pub fn record(media_id: u64, approved: bool, available: bool) -> RequestRecord {
    RequestRecord {
        id: media_id as i64,
        media_id: MediaId::new(media_id),
        media_kind: MediaKind::Movie,
        title: format!("Request {media_id}"),
        imdb_id: None,
        approved,
        available,
        requested_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StubProvider {
    pub items: Vec<MediaItem>,
    pub fail: bool,
    /// Reports itself unavailable, as a provider without credentials does.
    pub unconfigured: bool,
    pub max_delay_ms: u64,
    pub calls: AtomicUsize,
}

impl StubProvider {
    pub fn with_items(items: Vec<MediaItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn unconfigured(items: Vec<MediaItem>) -> Self {
        Self {
            items,
            unconfigured: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Result<Vec<MediaItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        jitter(0, self.max_delay_ms).await;
        if self.fail {
            return Err(Error::provider_unavailable("upstream returned 503"));
        }
        Ok(self.items.clone())
    }
}

#[async_trait]
impl MetadataProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn is_available(&self) -> bool {
        !self.unconfigured
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaItem>> {
        let all = self.answer().await?;
        let needle = query.to_lowercase();
        Ok(all
            .into_iter()
            .filter(|i| i.title.to_lowercase().contains(&needle))
            .collect())
    }

    async fn category(&self, _category: Category) -> Result<Vec<MediaItem>> {
        self.answer().await
    }

    async fn detail(&self, id: MediaId) -> Result<MediaItem> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        jitter(0, self.max_delay_ms).await;
        if self.fail {
            return Err(Error::provider_unavailable("upstream returned 503"));
        }
        self.items
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("movie", id))
    }
}

// ---------------------------------------------------------------------------
// Request store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StubStore {
    pub records: Vec<RequestRecord>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubStore {
    pub fn with_records(records: Vec<RequestRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestStore for StubStore {
    async fn request_index(&self, kind: MediaKind) -> Result<RequestIndex> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::database("database is locked"));
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.media_kind == kind)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

pub struct StubProbe {
    pub kind: ServerKind,
    pub enabled: bool,
    /// Ids this server reports as present.
    pub library: HashSet<MediaId>,
    pub fail: bool,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub calls: AtomicUsize,
    /// Lookups that ran to completion.
    pub finished: AtomicUsize,
    pub settings_reads: AtomicUsize,
    /// Media kinds lookups were asked for.
    pub kinds_seen: parking_lot::Mutex<HashSet<MediaKind>>,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl StubProbe {
    pub fn new(kind: ServerKind, enabled: bool) -> Self {
        Self {
            kind,
            enabled,
            library: HashSet::new(),
            fail: false,
            min_delay_ms: 0,
            max_delay_ms: 0,
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            settings_reads: AtomicUsize::new(0),
            kinds_seen: parking_lot::Mutex::new(HashSet::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn holding(mut self, ids: &[u64]) -> Self {
        self.library = ids.iter().copied().map(MediaId::new).collect();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_jitter(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Every lookup takes between `min_ms` and `max_ms`.
    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.min_delay_ms = min_ms;
        self.max_delay_ms = max_ms;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn link_for(kind: ServerKind, id: MediaId) -> Url {
        Url::parse(&format!("http://{kind}.local/item/{id}")).unwrap()
    }
}

#[async_trait]
impl AvailabilityProbe for StubProbe {
    fn kind(&self) -> ServerKind {
        self.kind
    }

    async fn settings(&self) -> Result<ServerSettings> {
        self.settings_reads.fetch_add(1, Ordering::SeqCst);
        Ok(ServerSettings {
            enabled: self.enabled,
            url: format!("http://{}.local", self.kind),
            token: "stub-token".into(),
        })
    }

    async fn lookup(&self, _settings: &ServerSettings, item: &MediaItem, kind: MediaKind) -> Result<Availability> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.kinds_seen.lock().insert(kind);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        jitter(self.min_delay_ms, self.max_delay_ms).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(Error::probe_failure(self.kind, "connection refused"));
        }
        if self.library.contains(&item.id) {
            Ok(Availability::available(Some(Self::link_for(self.kind, item.id))))
        } else {
            Ok(Availability::unavailable())
        }
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Engine wired to stub collaborators, with handles kept for assertions.
pub struct TestHarness {
    pub provider: Arc<StubProvider>,
    pub store: Arc<StubStore>,
    pub plex: Arc<StubProbe>,
    pub emby: Arc<StubProbe>,
    pub engine: ReconciliationEngine,
}

impl TestHarness {
    /// Both probes disabled, empty index.
    pub fn new(provider: StubProvider) -> Self {
        Self::with_parts(
            provider,
            StubStore::default(),
            StubProbe::new(ServerKind::Plex, false),
            StubProbe::new(ServerKind::Emby, false),
        )
    }

    pub fn with_parts(provider: StubProvider, store: StubStore, plex: StubProbe, emby: StubProbe) -> Self {
        let provider = Arc::new(provider);
        let store = Arc::new(store);
        let plex = Arc::new(plex);
        let emby = Arc::new(emby);

        let probes = ProbeSet::new().with(plex.clone()).with(emby.clone());
        let engine = ReconciliationEngine::new(provider.clone(), store.clone(), probes);

        Self {
            provider,
            store,
            plex,
            emby,
            engine,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.engine = self.engine.with_options(options);
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.plex.calls() + self.emby.calls()
    }
}
