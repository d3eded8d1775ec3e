use reelpool_types::{EngagementSnapshot, ReelAmount, REEL_BASE_UNIT};
use serde::{Deserialize, Serialize};

/// Per-event reward rates and the viral bonus rule.
///
/// Fixed at startup; a claim never observes a rate change mid-flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardSchedule {
    pub like_rate: ReelAmount,
    pub share_rate: ReelAmount,
    pub comment_rate: ReelAmount,
    pub viral_threshold: u64,
    pub viral_bonus: ReelAmount,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            like_rate: ReelAmount::from_base_units(REEL_BASE_UNIT / 10), // 0.1 REEL
            share_rate: ReelAmount::from_base_units(REEL_BASE_UNIT / 2), // 0.5 REEL
            comment_rate: ReelAmount::from_base_units(REEL_BASE_UNIT / 5), // 0.2 REEL
            viral_threshold: 1000,
            viral_bonus: ReelAmount::from_base_units(50 * REEL_BASE_UNIT), // 50 REEL
        }
    }
}

/// Maps engagement counts to a reward amount. Pure: no I/O, never fails.
#[derive(Debug, Clone)]
pub struct RewardCalculator {
    schedule: RewardSchedule,
}

impl RewardCalculator {
    pub fn new(schedule: RewardSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &RewardSchedule {
        &self.schedule
    }

    /// base = likes*like_rate + shares*share_rate + comments*comment_rate,
    /// plus the viral bonus once when likes >= threshold (inclusive).
    ///
    /// Saturates at max supply, keeping the function total for arbitrary
    /// u64 counters.
    pub fn compute(&self, snapshot: &EngagementSnapshot) -> ReelAmount {
        let base = self
            .schedule
            .like_rate
            .saturating_scale(snapshot.likes)
            .saturating_add(self.schedule.share_rate.saturating_scale(snapshot.shares))
            .saturating_add(self.schedule.comment_rate.saturating_scale(snapshot.comments));

        if snapshot.likes >= self.schedule.viral_threshold {
            base.saturating_add(self.schedule.viral_bonus)
        } else {
            base
        }
    }
}

impl Default for RewardCalculator {
    fn default() -> Self {
        Self::new(RewardSchedule::default())
    }
}
