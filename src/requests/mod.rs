//! Local request state, as seen by the reconciliation engine.
//!
//! The engine only ever reads a [`RequestIndex`]: a complete, per-kind
//! snapshot of request records keyed by canonical id. Producing it is the job
//! of a [`RequestStore`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use overseer_common::{Error, MediaId, MediaKind, Result};
use overseer_db::pool::{get_conn, DbPool};
use overseer_db::queries::requests;
use tracing::{debug, warn};

pub use overseer_db::models::RequestRecord;

/// Read-only mapping from canonical id to its request record.
///
/// Holds at most one record per id.
#[derive(Debug, Clone, Default)]
pub struct RequestIndex {
    records: HashMap<MediaId, RequestRecord>,
}

impl RequestIndex {
    /// Build an index, keeping the first record seen for any repeated id.
    pub fn from_records(records: impl IntoIterator<Item = RequestRecord>) -> Self {
        let mut map = HashMap::new();
        for record in records {
            match map.entry(record.media_id) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(existing) => {
                    warn!(
                        media_id = %record.media_id,
                        kept = existing.get().id,
                        dropped = record.id,
                        "Duplicate request record for media id; keeping the first"
                    );
                }
            }
        }
        Self { records: map }
    }

    pub fn get(&self, id: MediaId) -> Option<&RequestRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: MediaId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<RequestRecord> for RequestIndex {
    fn from_iter<T: IntoIterator<Item = RequestRecord>>(iter: T) -> Self {
        Self::from_records(iter)
    }
}

/// Source of request indexes.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Load every request record of `kind`.
    async fn request_index(&self, kind: MediaKind) -> Result<RequestIndex>;
}

/// [`RequestStore`] over the SQLite request table.
#[derive(Debug, Clone)]
pub struct SqliteRequestStore {
    pool: DbPool,
}

impl SqliteRequestStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl RequestStore for SqliteRequestStore {
    async fn request_index(&self, kind: MediaKind) -> Result<RequestIndex> {
        let pool = self.pool.clone();

        let records = tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            requests::list_requests(&conn, kind)
        })
        .await
        .map_err(|e| Error::internal(format!("request index task failed: {e}")))??;

        debug!(kind = %kind, count = records.len(), "Loaded request index");
        Ok(RequestIndex::from_records(records))
    }
}
