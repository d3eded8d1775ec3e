pub mod calculator;
pub mod engagement;
pub mod ledger;
pub mod orchestrator;
pub mod registry;

pub use calculator::{RewardCalculator, RewardSchedule};
pub use engagement::{EngagementStore, MemoryEngagementStore, VideoMeta};
pub use ledger::{InProcessLedger, LedgerError, SettlementLedger, SettlementStatus};
pub use orchestrator::{ClaimOrchestrator, ClaimReceipt, RetryPolicy};
pub use registry::{ClaimRecord, ClaimRegistry, ClaimStore, MemoryClaimStore};

use std::sync::Arc;

/// Wires the reward components into one engine.
pub struct RewardsEngine {
    pub engagement: Arc<dyn EngagementStore>,
    pub ledger: Arc<dyn SettlementLedger>,
    pub registry: Arc<ClaimRegistry>,
    pub orchestrator: Arc<ClaimOrchestrator>,
}

impl RewardsEngine {
    pub fn new(
        engagement: Arc<dyn EngagementStore>,
        ledger: Arc<dyn SettlementLedger>,
        claim_store: Arc<dyn ClaimStore>,
        schedule: RewardSchedule,
        retry: RetryPolicy,
    ) -> Self {
        let registry = Arc::new(ClaimRegistry::new(claim_store));
        let orchestrator = Arc::new(ClaimOrchestrator::new(
            engagement.clone(),
            RewardCalculator::new(schedule),
            ledger.clone(),
            registry.clone(),
            retry,
        ));

        Self {
            engagement,
            ledger,
            registry,
            orchestrator,
        }
    }
}
