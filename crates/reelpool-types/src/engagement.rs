use crate::id::VideoId;
use serde::{Deserialize, Serialize};

/// Engagement counters for a video at the instant of claim evaluation.
///
/// Immutable once read; a claim attempt consumes exactly one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    pub video_id: VideoId,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
}

impl EngagementSnapshot {
    pub fn new(video_id: VideoId, likes: u64, shares: u64, comments: u64) -> Self {
        Self {
            video_id,
            likes,
            shares,
            comments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.likes == 0 && self.shares == 0 && self.comments == 0
    }
}
