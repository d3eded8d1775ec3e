//! Coordinates snapshot read, reward computation, settlement and the claim
//! registry compare-and-set into a single definitive outcome per claim call.
//!
//! The settle-and-record phase runs on a detached task: a caller that stops
//! waiting cannot abandon a settlement mid-flight, and the settlement's true
//! outcome is always resolved before the registry is touched.

use crate::calculator::RewardCalculator;
use crate::engagement::EngagementStore;
use crate::ledger::{LedgerError, SettlementLedger, SettlementStatus};
use crate::registry::ClaimRegistry;
use chrono::Utc;
use reelpool_types::{AccountAddress, ClaimError, ReelAmount, VideoId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Retry and status-resolution budget for one claim attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total submit attempts when the ledger is unreachable.
    pub max_submit_attempts: u32,
    /// Base backoff between submit attempts, doubled each retry.
    pub submit_backoff: Duration,
    /// Status polls before a pending settlement is reported as unknown.
    pub status_poll_attempts: u32,
    pub status_poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_submit_attempts: 3,
            submit_backoff: Duration::from_millis(200),
            status_poll_attempts: 10,
            status_poll_interval: Duration::from_millis(500),
        }
    }
}

/// Outcome of a successful claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub video_id: VideoId,
    pub amount: ReelAmount,
    pub settlement_ref: String,
    pub settled_at: i64,
}

#[derive(Clone)]
pub struct ClaimOrchestrator {
    engagement: Arc<dyn EngagementStore>,
    calculator: RewardCalculator,
    ledger: Arc<dyn SettlementLedger>,
    registry: Arc<ClaimRegistry>,
    retry: RetryPolicy,
}

impl ClaimOrchestrator {
    pub fn new(
        engagement: Arc<dyn EngagementStore>,
        calculator: RewardCalculator,
        ledger: Arc<dyn SettlementLedger>,
        registry: Arc<ClaimRegistry>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            engagement,
            calculator,
            ledger,
            registry,
            retry,
        }
    }

    pub fn calculator(&self) -> &RewardCalculator {
        &self.calculator
    }

    /// Reward the current snapshot would yield, with no side effects.
    pub async fn preview(&self, video_id: &VideoId) -> Result<ReelAmount, ClaimError> {
        let snapshot = self
            .engagement
            .get_snapshot(video_id)
            .await
            .map_err(|e| ClaimError::Storage(e.to_string()))?
            .ok_or_else(|| ClaimError::NotFound(video_id.to_string()))?;
        Ok(self.calculator.compute(&snapshot))
    }

    /// Convert a video's engagement into a settled reward, at most once.
    ///
    /// Preconditions are checked in order, short-circuiting on the first
    /// failure; the registry CAS after a confirmed settlement is the only
    /// authoritative write.
    pub async fn claim(
        &self,
        video_id: &VideoId,
        requester: AccountAddress,
    ) -> Result<ClaimReceipt, ClaimError> {
        let snapshot = self
            .engagement
            .get_snapshot(video_id)
            .await
            .map_err(|e| ClaimError::Storage(e.to_string()))?
            .ok_or_else(|| ClaimError::NotFound(video_id.to_string()))?;

        let creator = self
            .engagement
            .get_creator(video_id)
            .await
            .map_err(|e| ClaimError::Storage(e.to_string()))?
            .ok_or_else(|| ClaimError::NotFound(video_id.to_string()))?;
        if creator != requester {
            warn!(
                video_id = %video_id,
                requester = %requester,
                creator = %creator,
                "🚫 Claim by non-creator rejected"
            );
            return Err(ClaimError::Unauthorized);
        }

        // Advisory: the CAS below still guards the race.
        if self
            .registry
            .is_settled(video_id)
            .await
            .map_err(|e| ClaimError::Storage(e.to_string()))?
        {
            return Err(ClaimError::AlreadyClaimed);
        }

        let amount = self.calculator.compute(&snapshot);
        if amount.is_zero() {
            return Err(ClaimError::NoReward);
        }

        info!(
            video_id = %video_id,
            requester = %requester,
            likes = snapshot.likes,
            shares = snapshot.shares,
            comments = snapshot.comments,
            amount = %amount,
            "🎬 Claim accepted, submitting settlement"
        );

        // Detached so a dropped caller cannot cancel an in-flight settlement
        // before its outcome is resolved and recorded.
        let worker = self.clone();
        let video = video_id.clone();
        let handle =
            tokio::spawn(async move { worker.settle_and_record(&video, requester, amount).await });

        handle
            .await
            .map_err(|e| ClaimError::Unknown(format!("claim task aborted: {}", e)))?
    }

    async fn settle_and_record(
        &self,
        video_id: &VideoId,
        requester: AccountAddress,
        amount: ReelAmount,
    ) -> Result<ClaimReceipt, ClaimError> {
        let key = Self::idempotency_key(video_id, &requester);

        let settlement_ref = self.submit_with_retry(video_id, requester, amount, &key).await?;
        self.resolve_settlement(video_id, &settlement_ref).await?;

        let settled_at = Utc::now().timestamp();
        let won = match self
            .registry
            .try_mark_settled(video_id, amount, &settlement_ref, settled_at)
            .await
        {
            Ok(won) => won,
            Err(e) => {
                // Settlement happened but is not recorded. Surfaced for
                // out-of-band reconciliation; a fresh settlement here would
                // double-pay.
                error!(
                    video_id = %video_id,
                    settlement_ref = %settlement_ref,
                    amount = %amount,
                    error = %e,
                    "🚨 RECONCILIATION REQUIRED: settlement confirmed but claim record write failed"
                );
                return Err(ClaimError::ReconciliationRequired {
                    settlement_ref,
                    reason: e.to_string(),
                });
            }
        };

        if !won {
            // A concurrent attempt under the same idempotency key recorded
            // this settlement first; the ledger settled exactly once.
            info!(
                video_id = %video_id,
                settlement_ref = %settlement_ref,
                "Claim CAS lost after settlement; already recorded by concurrent attempt"
            );
            return Err(ClaimError::AlreadyClaimed);
        }

        info!(
            video_id = %video_id,
            requester = %requester,
            amount = %amount,
            settlement_ref = %settlement_ref,
            "🎯 Claim settled"
        );

        Ok(ClaimReceipt {
            video_id: video_id.clone(),
            amount,
            settlement_ref,
            settled_at,
        })
    }

    async fn submit_with_retry(
        &self,
        video_id: &VideoId,
        requester: AccountAddress,
        amount: ReelAmount,
        key: &str,
    ) -> Result<String, ClaimError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.ledger.submit(requester, amount, key).await {
                Ok(settlement_ref) => return Ok(settlement_ref),
                Err(LedgerError::Unreachable(msg)) if attempt < self.retry.max_submit_attempts => {
                    let backoff = self.retry.submit_backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        video_id = %video_id,
                        attempt = attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %msg,
                        "🔄 Ledger unreachable, retrying settlement"
                    );
                    sleep(backoff).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Resolve a submission to a definitive outcome before the registry is
    /// touched; the caller never sees an ambiguous success.
    async fn resolve_settlement(
        &self,
        video_id: &VideoId,
        settlement_ref: &str,
    ) -> Result<(), ClaimError> {
        for attempt in 1..=self.retry.status_poll_attempts {
            match self.ledger.get_status(settlement_ref).await {
                Ok(SettlementStatus::Confirmed) => return Ok(()),
                Ok(SettlementStatus::Failed) => {
                    return Err(ClaimError::Rejected(format!(
                        "settlement {} failed on ledger",
                        settlement_ref
                    )))
                }
                Ok(SettlementStatus::Pending) => {
                    sleep(self.retry.status_poll_interval).await;
                }
                Err(LedgerError::Unreachable(msg)) => {
                    warn!(
                        video_id = %video_id,
                        settlement_ref = %settlement_ref,
                        attempt = attempt,
                        error = %msg,
                        "🔄 Status poll failed, retrying"
                    );
                    sleep(self.retry.status_poll_interval).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ClaimError::Unknown(format!(
            "settlement {} unresolved after {} polls",
            settlement_ref, self.retry.status_poll_attempts
        )))
    }

    fn idempotency_key(video_id: &VideoId, requester: &AccountAddress) -> String {
        // Claim-scoped, not attempt-scoped: every retry of the same claim
        // deduplicates to one settlement on the ledger.
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"reelpool.claim.v1");
        hasher.update(video_id.as_str().as_bytes());
        hasher.update(requester.as_bytes());
        hex::encode(hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::MemoryEngagementStore;
    use crate::ledger::InProcessLedger;
    use crate::registry::MemoryClaimStore;

    fn vid(s: &str) -> VideoId {
        VideoId::new(s).unwrap()
    }

    async fn orchestrator_with_video(
        likes: u64,
        shares: u64,
        comments: u64,
    ) -> (ClaimOrchestrator, AccountAddress) {
        let creator = AccountAddress::from_bytes([7; 20]);
        let engagement = Arc::new(MemoryEngagementStore::new());
        engagement
            .register_video(vid("v1"), creator, "reel")
            .await
            .unwrap();
        if likes + shares + comments > 0 {
            engagement
                .record_engagement(&vid("v1"), likes, shares, comments)
                .await
                .unwrap();
        }

        let orchestrator = ClaimOrchestrator::new(
            engagement,
            RewardCalculator::default(),
            Arc::new(InProcessLedger::new(ReelAmount::from_reel(1_000_000.0))),
            Arc::new(ClaimRegistry::new(Arc::new(MemoryClaimStore::new()))),
            RetryPolicy::default(),
        );
        (orchestrator, creator)
    }

    #[tokio::test]
    async fn test_claim_happy_path() {
        let (orchestrator, creator) = orchestrator_with_video(10, 5, 3).await;

        let receipt = orchestrator.claim(&vid("v1"), creator).await.unwrap();
        assert_eq!(receipt.amount, ReelAmount::from_base_units(4_100_000_000_000_000_000));
        assert!(!receipt.settlement_ref.is_empty());
    }

    #[tokio::test]
    async fn test_second_claim_already_claimed() {
        let (orchestrator, creator) = orchestrator_with_video(10, 5, 3).await;

        orchestrator.claim(&vid("v1"), creator).await.unwrap();
        let err = orchestrator.claim(&vid("v1"), creator).await.unwrap_err();
        assert!(matches!(err, ClaimError::AlreadyClaimed));
    }

    #[tokio::test]
    async fn test_unknown_video_not_found() {
        let (orchestrator, creator) = orchestrator_with_video(1, 0, 0).await;
        let err = orchestrator.claim(&vid("missing"), creator).await.unwrap_err();
        assert!(matches!(err, ClaimError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_non_creator_unauthorized() {
        let (orchestrator, _creator) = orchestrator_with_video(1, 0, 0).await;
        let stranger = AccountAddress::from_bytes([9; 20]);
        let err = orchestrator.claim(&vid("v1"), stranger).await.unwrap_err();
        assert!(matches!(err, ClaimError::Unauthorized));
    }

    #[tokio::test]
    async fn test_zero_engagement_no_reward() {
        let (orchestrator, creator) = orchestrator_with_video(0, 0, 0).await;
        let err = orchestrator.claim(&vid("v1"), creator).await.unwrap_err();
        assert!(matches!(err, ClaimError::NoReward));
    }

    #[tokio::test]
    async fn test_preview_has_no_side_effects() {
        let (orchestrator, creator) = orchestrator_with_video(1000, 0, 0).await;

        let preview = orchestrator.preview(&vid("v1")).await.unwrap();
        assert_eq!(preview, ReelAmount::from_reel(150.0));

        // Preview did not settle anything.
        let receipt = orchestrator.claim(&vid("v1"), creator).await.unwrap();
        assert_eq!(receipt.amount, preview);
    }

    #[test]
    fn test_idempotency_key_is_stable() {
        let requester = AccountAddress::from_bytes([1; 20]);
        let a = ClaimOrchestrator::idempotency_key(&vid("v1"), &requester);
        let b = ClaimOrchestrator::idempotency_key(&vid("v1"), &requester);
        assert_eq!(a, b);

        let other = ClaimOrchestrator::idempotency_key(&vid("v2"), &requester);
        assert_ne!(a, other);
    }
}
