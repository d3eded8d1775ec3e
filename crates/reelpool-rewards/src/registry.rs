use anyhow::Result;
use async_trait::async_trait;
use reelpool_types::{ReelAmount, VideoId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Per-video claim state. Created implicitly unsettled; transitions to
/// settled at most once and is never reverted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub video_id: VideoId,
    pub settled: bool,
    pub amount: ReelAmount,
    pub settlement_ref: Option<String>,
    pub settled_at: Option<i64>,
}

impl ClaimRecord {
    pub fn unsettled(video_id: VideoId) -> Self {
        Self {
            video_id,
            settled: false,
            amount: ReelAmount::ZERO,
            settlement_ref: None,
            settled_at: None,
        }
    }
}

/// Persistence contract for claim state.
///
/// `try_mark_settled` must be an atomic read-modify-write at videoId
/// granularity: it succeeds only when the prior state was unsettled and
/// returns false without mutating otherwise. This compare-and-set is the
/// sole serialization point for concurrent claims on the same video.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn get(&self, video_id: &VideoId) -> Result<Option<ClaimRecord>>;

    async fn try_mark_settled(
        &self,
        video_id: &VideoId,
        amount: ReelAmount,
        settlement_ref: &str,
        settled_at: i64,
    ) -> Result<bool>;
}

/// In-memory claim store. The write lock spans the whole read-modify-write,
/// which gives the CAS its atomicity.
pub struct MemoryClaimStore {
    records: Arc<RwLock<HashMap<VideoId, ClaimRecord>>>,
}

impl Default for MemoryClaimStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn get(&self, video_id: &VideoId) -> Result<Option<ClaimRecord>> {
        let records = self.records.read().await;
        Ok(records.get(video_id).cloned())
    }

    async fn try_mark_settled(
        &self,
        video_id: &VideoId,
        amount: ReelAmount,
        settlement_ref: &str,
        settled_at: i64,
    ) -> Result<bool> {
        let mut records = self.records.write().await;
        let record = records
            .entry(video_id.clone())
            .or_insert_with(|| ClaimRecord::unsettled(video_id.clone()));

        if record.settled {
            return Ok(false);
        }

        record.settled = true;
        record.amount = amount;
        record.settlement_ref = Some(settlement_ref.to_string());
        record.settled_at = Some(settled_at);
        Ok(true)
    }
}

#[cfg(feature = "rocksdb")]
pub struct RocksDbClaimStore {
    db: Arc<rocksdb::DB>,
    cf_claims: String,
    // RocksDB has no conditional put, so the read-modify-write of the CAS is
    // serialized here. Scope is a single record update.
    write_lock: tokio::sync::Mutex<()>,
}

#[cfg(feature = "rocksdb")]
impl RocksDbClaimStore {
    pub fn new(path: &str) -> Result<Self> {
        use rocksdb::{Options, DB};

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, path, ["claims"])?;

        Ok(Self {
            db: Arc::new(db),
            cf_claims: "claims".to_string(),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    fn read_record(&self, video_id: &VideoId) -> Result<Option<ClaimRecord>> {
        let cf = self
            .db
            .cf_handle(&self.cf_claims)
            .ok_or_else(|| anyhow::anyhow!("Column family not found"))?;

        match self.db.get_cf(cf, video_id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(feature = "rocksdb")]
#[async_trait]
impl ClaimStore for RocksDbClaimStore {
    async fn get(&self, video_id: &VideoId) -> Result<Option<ClaimRecord>> {
        self.read_record(video_id)
    }

    async fn try_mark_settled(
        &self,
        video_id: &VideoId,
        amount: ReelAmount,
        settlement_ref: &str,
        settled_at: i64,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut record = self
            .read_record(video_id)?
            .unwrap_or_else(|| ClaimRecord::unsettled(video_id.clone()));

        if record.settled {
            return Ok(false);
        }

        record.settled = true;
        record.amount = amount;
        record.settlement_ref = Some(settlement_ref.to_string());
        record.settled_at = Some(settled_at);

        let cf = self
            .db
            .cf_handle(&self.cf_claims)
            .ok_or_else(|| anyhow::anyhow!("Column family not found"))?;
        self.db
            .put_cf(cf, video_id.as_str().as_bytes(), serde_json::to_vec(&record)?)?;
        Ok(true)
    }
}

/// Logging wrapper over a `ClaimStore`; everything but the CAS is advisory.
pub struct ClaimRegistry {
    store: Arc<dyn ClaimStore>,
}

impl ClaimRegistry {
    pub fn new(store: Arc<dyn ClaimStore>) -> Self {
        Self { store }
    }

    pub async fn get_record(&self, video_id: &VideoId) -> Result<Option<ClaimRecord>> {
        self.store.get(video_id).await
    }

    /// Advisory fast path; only the CAS result is authoritative.
    pub async fn is_settled(&self, video_id: &VideoId) -> Result<bool> {
        Ok(self
            .store
            .get(video_id)
            .await?
            .map(|r| r.settled)
            .unwrap_or(false))
    }

    pub async fn try_mark_settled(
        &self,
        video_id: &VideoId,
        amount: ReelAmount,
        settlement_ref: &str,
        settled_at: i64,
    ) -> Result<bool> {
        let won = self
            .store
            .try_mark_settled(video_id, amount, settlement_ref, settled_at)
            .await?;

        if won {
            info!(
                video_id = %video_id,
                amount = %amount,
                settlement_ref = %settlement_ref,
                "✅ Claim marked settled"
            );
        } else {
            debug!(
                video_id = %video_id,
                "Claim CAS lost: already settled"
            );
        }
        Ok(won)
    }
}
