use crate::config::NodeConfig;
use anyhow::Result;
use chrono::Utc;
use reelpool_rewards::{
    ClaimRecord, ClaimReceipt, ClaimStore, InProcessLedger, MemoryClaimStore,
    MemoryEngagementStore, RewardsEngine, SettlementLedger, VideoMeta,
};
use reelpool_types::{AccountAddress, ClaimError, EngagementSnapshot, ReelAmount, VideoId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStats {
    pub name: String,
    pub uptime_secs: i64,
    pub videos: usize,
    pub settlements: usize,
    pub pool_remaining: String,
}

/// Composes config, stores, ledger and the rewards engine into one node.
pub struct RewardsNode {
    config: NodeConfig,
    engine: RewardsEngine,
    engagement: Arc<MemoryEngagementStore>,
    ledger: Arc<InProcessLedger>,
    started_at: i64,
}

impl RewardsNode {
    pub fn new(config: NodeConfig) -> Result<Self> {
        let engagement = Arc::new(MemoryEngagementStore::new());
        let ledger = Arc::new(InProcessLedger::new(ReelAmount::from_reel(
            config.ledger.pool_funds,
        )));

        let claim_store: Arc<dyn ClaimStore> = match config.storage.backend.as_str() {
            "memory" => Arc::new(MemoryClaimStore::new()),
            #[cfg(feature = "rocksdb")]
            "rocksdb" => {
                let path = config.node.data_dir.join("claims");
                std::fs::create_dir_all(&path)?;
                Arc::new(reelpool_rewards::registry::RocksDbClaimStore::new(
                    path.to_str()
                        .ok_or_else(|| anyhow::anyhow!("Invalid data dir"))?,
                )?)
            }
            other => anyhow::bail!("Unknown storage backend: {}", other),
        };

        let engine = RewardsEngine::new(
            engagement.clone(),
            ledger.clone(),
            claim_store,
            config.reward_schedule(),
            config.retry_policy(),
        );

        info!(
            name = %config.node.name,
            backend = %config.storage.backend,
            pool_funds = config.ledger.pool_funds,
            "🚀 Rewards node initialized"
        );

        Ok(Self {
            config,
            engine,
            engagement,
            ledger,
            started_at: Utc::now().timestamp(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub async fn claim(
        &self,
        video_id: &VideoId,
        requester: AccountAddress,
    ) -> Result<ClaimReceipt, ClaimError> {
        self.engine.orchestrator.claim(video_id, requester).await
    }

    pub async fn preview_reward(&self, video_id: &VideoId) -> Result<ReelAmount, ClaimError> {
        self.engine.orchestrator.preview(video_id).await
    }

    pub async fn get_claim_record(&self, video_id: &VideoId) -> Result<Option<ClaimRecord>> {
        self.engine.registry.get_record(video_id).await
    }

    pub async fn register_video(
        &self,
        video_id: VideoId,
        creator: AccountAddress,
        title: impl Into<String>,
    ) -> Result<VideoMeta> {
        self.engagement.register_video(video_id, creator, title).await
    }

    pub async fn record_engagement(
        &self,
        video_id: &VideoId,
        likes: u64,
        shares: u64,
        comments: u64,
    ) -> Result<EngagementSnapshot> {
        self.engagement
            .record_engagement(video_id, likes, shares, comments)
            .await
    }

    pub async fn get_video(&self, video_id: &VideoId) -> Option<VideoMeta> {
        self.engagement.get_meta(video_id).await
    }

    pub async fn get_snapshot(&self, video_id: &VideoId) -> Result<Option<EngagementSnapshot>> {
        use reelpool_rewards::EngagementStore;
        self.engagement.get_snapshot(video_id).await
    }

    pub async fn balance_of(&self, address: AccountAddress) -> Result<ReelAmount, ClaimError> {
        self.ledger
            .balance_of(address)
            .await
            .map_err(ClaimError::from)
    }

    pub async fn pool_remaining(&self) -> ReelAmount {
        self.ledger.pool_remaining().await
    }

    pub async fn get_stats(&self) -> NodeStats {
        NodeStats {
            name: self.config.node.name.clone(),
            uptime_secs: Utc::now().timestamp() - self.started_at,
            videos: self.engagement.video_count().await,
            settlements: self.ledger.settlement_count().await,
            pool_remaining: self.ledger.pool_remaining().await.to_string(),
        }
    }
}
