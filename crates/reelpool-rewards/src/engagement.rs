use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reelpool_types::{AccountAddress, EngagementSnapshot, VideoId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Video metadata as recorded at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMeta {
    pub video_id: VideoId,
    pub creator: AccountAddress,
    pub title: String,
    pub registered_at: i64,
}

/// Read surface of the engagement counters.
///
/// The claim engine only ever reads from this store; counter increments and
/// fan-out belong to the surrounding platform.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn get_snapshot(&self, video_id: &VideoId) -> Result<Option<EngagementSnapshot>>;
    async fn get_creator(&self, video_id: &VideoId) -> Result<Option<AccountAddress>>;
}

#[derive(Debug, Clone, Default)]
struct Counters {
    likes: u64,
    shares: u64,
    comments: u64,
}

struct VideoEntry {
    meta: VideoMeta,
    counters: Counters,
}

/// In-memory engagement store backing a single-node deployment and tests.
pub struct MemoryEngagementStore {
    videos: Arc<RwLock<HashMap<VideoId, VideoEntry>>>,
}

impl Default for MemoryEngagementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngagementStore {
    pub fn new() -> Self {
        Self {
            videos: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register_video(
        &self,
        video_id: VideoId,
        creator: AccountAddress,
        title: impl Into<String>,
    ) -> Result<VideoMeta> {
        let mut videos = self.videos.write().await;
        if videos.contains_key(&video_id) {
            anyhow::bail!("Video already registered: {}", video_id);
        }

        let meta = VideoMeta {
            video_id: video_id.clone(),
            creator,
            title: title.into(),
            registered_at: Utc::now().timestamp(),
        };

        videos.insert(
            video_id.clone(),
            VideoEntry {
                meta: meta.clone(),
                counters: Counters::default(),
            },
        );

        info!(
            video_id = %video_id,
            creator = %creator,
            "🎬 Video registered"
        );
        Ok(meta)
    }

    pub async fn get_meta(&self, video_id: &VideoId) -> Option<VideoMeta> {
        let videos = self.videos.read().await;
        videos.get(video_id).map(|e| e.meta.clone())
    }

    pub async fn video_count(&self) -> usize {
        let videos = self.videos.read().await;
        videos.len()
    }

    pub async fn record_engagement(
        &self,
        video_id: &VideoId,
        likes: u64,
        shares: u64,
        comments: u64,
    ) -> Result<EngagementSnapshot> {
        let mut videos = self.videos.write().await;
        let entry = videos
            .get_mut(video_id)
            .ok_or_else(|| anyhow::anyhow!("Video not found: {}", video_id))?;

        entry.counters.likes = entry.counters.likes.saturating_add(likes);
        entry.counters.shares = entry.counters.shares.saturating_add(shares);
        entry.counters.comments = entry.counters.comments.saturating_add(comments);

        debug!(
            video_id = %video_id,
            likes = entry.counters.likes,
            shares = entry.counters.shares,
            comments = entry.counters.comments,
            "📈 Engagement recorded"
        );

        Ok(EngagementSnapshot::new(
            video_id.clone(),
            entry.counters.likes,
            entry.counters.shares,
            entry.counters.comments,
        ))
    }
}

#[async_trait]
impl EngagementStore for MemoryEngagementStore {
    async fn get_snapshot(&self, video_id: &VideoId) -> Result<Option<EngagementSnapshot>> {
        let videos = self.videos.read().await;
        Ok(videos.get(video_id).map(|e| {
            EngagementSnapshot::new(
                video_id.clone(),
                e.counters.likes,
                e.counters.shares,
                e.counters.comments,
            )
        }))
    }

    async fn get_creator(&self, video_id: &VideoId) -> Result<Option<AccountAddress>> {
        let videos = self.videos.read().await;
        Ok(videos.get(video_id).map(|e| e.meta.creator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(s: &str) -> VideoId {
        VideoId::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_snapshot() {
        let store = MemoryEngagementStore::new();
        let creator = AccountAddress::from_bytes([1; 20]);

        store
            .register_video(vid("v1"), creator, "first reel")
            .await
            .unwrap();

        let snapshot = store.get_snapshot(&vid("v1")).await.unwrap().unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(store.get_creator(&vid("v1")).await.unwrap(), Some(creator));
    }

    #[tokio::test]
    async fn test_unknown_video_is_none() {
        let store = MemoryEngagementStore::new();
        assert!(store.get_snapshot(&vid("missing")).await.unwrap().is_none());
        assert!(store.get_creator(&vid("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let store = MemoryEngagementStore::new();
        let creator = AccountAddress::from_bytes([2; 20]);
        store.register_video(vid("v1"), creator, "a").await.unwrap();
        assert!(store.register_video(vid("v1"), creator, "b").await.is_err());
    }

    #[tokio::test]
    async fn test_engagement_accumulates() {
        let store = MemoryEngagementStore::new();
        let creator = AccountAddress::from_bytes([3; 20]);
        store.register_video(vid("v1"), creator, "a").await.unwrap();

        store.record_engagement(&vid("v1"), 5, 1, 0).await.unwrap();
        let snapshot = store.record_engagement(&vid("v1"), 5, 4, 3).await.unwrap();

        assert_eq!(snapshot.likes, 10);
        assert_eq!(snapshot.shares, 5);
        assert_eq!(snapshot.comments, 3);
    }
}
