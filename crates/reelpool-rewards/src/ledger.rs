use async_trait::async_trait;
use chrono::Utc;
use reelpool_types::{AccountAddress, ClaimError, ReelAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Ledger-side view of a submitted settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    Pending,
    Confirmed,
    Failed,
}

/// Failure classification for settlement submission.
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("unknown: {0}")]
    Unknown(String),
}

impl From<LedgerError> for ClaimError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds(msg) => ClaimError::InsufficientFunds(msg),
            LedgerError::Rejected(msg) => ClaimError::Rejected(msg),
            LedgerError::Unreachable(msg) => ClaimError::Unreachable(msg),
            LedgerError::Unknown(msg) => ClaimError::Unknown(msg),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub settlement_ref: String,
    pub to: AccountAddress,
    pub amount: ReelAmount,
    pub status: SettlementStatus,
    pub submitted_at: i64,
}

/// Token settlement ledger, at-most-once per call from the orchestrator's
/// perspective. A resubmission under the same idempotency key must return
/// the original settlement reference instead of settling twice.
#[async_trait]
pub trait SettlementLedger: Send + Sync {
    async fn submit(
        &self,
        to: AccountAddress,
        amount: ReelAmount,
        idempotency_key: &str,
    ) -> Result<String, LedgerError>;

    async fn get_status(&self, settlement_ref: &str) -> Result<SettlementStatus, LedgerError>;

    async fn balance_of(&self, address: AccountAddress) -> Result<ReelAmount, LedgerError>;
}

struct LedgerState {
    pool_remaining: ReelAmount,
    balances: HashMap<AccountAddress, ReelAmount>,
    settlements: HashMap<String, SettlementRecord>,
    by_idempotency_key: HashMap<String, String>,
}

/// Supply-capped ledger for single-node deployments and tests.
///
/// Settles by minting from a fixed reward pool; dedupes on idempotency key.
pub struct InProcessLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InProcessLedger {
    pub fn new(pool_funds: ReelAmount) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState {
                pool_remaining: pool_funds,
                balances: HashMap::new(),
                settlements: HashMap::new(),
                by_idempotency_key: HashMap::new(),
            })),
        }
    }

    pub async fn pool_remaining(&self) -> ReelAmount {
        let state = self.state.read().await;
        state.pool_remaining
    }

    /// Top up the reward pool. A claim that failed with insufficient funds
    /// may succeed once the pool is funded again.
    pub async fn fund(&self, amount: ReelAmount) {
        let mut state = self.state.write().await;
        state.pool_remaining = state.pool_remaining.saturating_add(amount);
        info!(
            amount = %amount,
            pool_remaining = %state.pool_remaining,
            "🏦 Reward pool funded"
        );
    }

    pub async fn settlement_count(&self) -> usize {
        let state = self.state.read().await;
        state.settlements.len()
    }

    fn derive_ref(to: &AccountAddress, amount: ReelAmount, key: &str, at: i64) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(to.as_bytes());
        hasher.update(&amount.to_base_units().to_le_bytes());
        hasher.update(key.as_bytes());
        hasher.update(&at.to_le_bytes());
        hex::encode(hasher.finalize().as_bytes())
    }
}

#[async_trait]
impl SettlementLedger for InProcessLedger {
    async fn submit(
        &self,
        to: AccountAddress,
        amount: ReelAmount,
        idempotency_key: &str,
    ) -> Result<String, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::Rejected("zero-amount settlement".to_string()));
        }

        let mut state = self.state.write().await;

        // Resubmission under a known key settles nothing new.
        if let Some(existing_ref) = state.by_idempotency_key.get(idempotency_key) {
            let existing_ref = existing_ref.clone();
            info!(
                settlement_ref = %existing_ref,
                idempotency_key = %idempotency_key,
                "🔁 Settlement deduplicated by idempotency key"
            );
            return Ok(existing_ref);
        }

        let remaining = state.pool_remaining;
        let new_remaining = remaining.checked_sub(amount).ok_or_else(|| {
            warn!(
                to = %to,
                amount = %amount,
                pool_remaining = %remaining,
                "⚠️ Reward pool exhausted"
            );
            LedgerError::InsufficientFunds(format!(
                "reward pool has {}, needs {}",
                remaining, amount
            ))
        })?;

        let now = Utc::now().timestamp();
        let settlement_ref = Self::derive_ref(&to, amount, idempotency_key, now);

        state.pool_remaining = new_remaining;
        let balance = state.balances.entry(to).or_insert(ReelAmount::ZERO);
        *balance = balance.saturating_add(amount);

        state.settlements.insert(
            settlement_ref.clone(),
            SettlementRecord {
                settlement_ref: settlement_ref.clone(),
                to,
                amount,
                status: SettlementStatus::Confirmed,
                submitted_at: now,
            },
        );
        state
            .by_idempotency_key
            .insert(idempotency_key.to_string(), settlement_ref.clone());

        info!(
            to = %to,
            amount = %amount,
            settlement_ref = %settlement_ref,
            pool_remaining = %new_remaining,
            "💰 Settlement confirmed"
        );
        Ok(settlement_ref)
    }

    async fn get_status(&self, settlement_ref: &str) -> Result<SettlementStatus, LedgerError> {
        let state = self.state.read().await;
        state
            .settlements
            .get(settlement_ref)
            .map(|r| r.status)
            .ok_or_else(|| {
                LedgerError::Unknown(format!("no settlement with ref {}", settlement_ref))
            })
    }

    async fn balance_of(&self, address: AccountAddress) -> Result<ReelAmount, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .balances
            .get(&address)
            .copied()
            .unwrap_or(ReelAmount::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_credits_recipient() {
        let ledger = InProcessLedger::new(ReelAmount::from_reel(100.0));
        let to = AccountAddress::from_bytes([1; 20]);

        let settlement_ref = ledger
            .submit(to, ReelAmount::from_reel(4.1), "key-1")
            .await
            .unwrap();

        assert_eq!(
            ledger.get_status(&settlement_ref).await.unwrap(),
            SettlementStatus::Confirmed
        );
        assert_eq!(
            ledger.balance_of(to).await.unwrap(),
            ReelAmount::from_reel(4.1)
        );
    }

    #[tokio::test]
    async fn test_idempotency_key_dedupes() {
        let ledger = InProcessLedger::new(ReelAmount::from_reel(100.0));
        let to = AccountAddress::from_bytes([2; 20]);

        let first = ledger
            .submit(to, ReelAmount::from_reel(5.0), "key-1")
            .await
            .unwrap();
        let second = ledger
            .submit(to, ReelAmount::from_reel(5.0), "key-1")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.settlement_count().await, 1);
        assert_eq!(
            ledger.balance_of(to).await.unwrap(),
            ReelAmount::from_reel(5.0)
        );
    }

    #[tokio::test]
    async fn test_pool_exhaustion() {
        let ledger = InProcessLedger::new(ReelAmount::from_reel(1.0));
        let to = AccountAddress::from_bytes([3; 20]);

        let err = ledger
            .submit(to, ReelAmount::from_reel(2.0), "key-1")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds(_)));

        // Nothing was settled or credited.
        assert_eq!(ledger.settlement_count().await, 0);
        assert_eq!(ledger.balance_of(to).await.unwrap(), ReelAmount::ZERO);
        assert_eq!(ledger.pool_remaining().await, ReelAmount::from_reel(1.0));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let ledger = InProcessLedger::new(ReelAmount::from_reel(1.0));
        let to = AccountAddress::from_bytes([4; 20]);
        let err = ledger.submit(to, ReelAmount::ZERO, "key-1").await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_unknown_ref_status() {
        let ledger = InProcessLedger::new(ReelAmount::from_reel(1.0));
        assert!(matches!(
            ledger.get_status("deadbeef").await,
            Err(LedgerError::Unknown(_))
        ));
    }
}
