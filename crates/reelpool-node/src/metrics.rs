use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    pub claims_submitted: IntCounter,
    pub claims_settled: IntCounter,
    pub claims_failed: IntCounterVec,
    pub claim_duration: Histogram,
    pub reward_settled_reel: Histogram,
    pub reconciliation_required: IntCounter,

    pub videos_registered: IntCounter,
    pub engagement_events: IntCounter,

    pub pool_remaining_reel: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let claims_submitted =
            IntCounter::new("reelpool_claims_submitted_total", "Claim requests received").unwrap();
        let claims_settled =
            IntCounter::new("reelpool_claims_settled_total", "Claims settled successfully")
                .unwrap();
        let claims_failed = IntCounterVec::new(
            Opts::new("reelpool_claims_failed_total", "Failed claims by error kind"),
            &["kind"],
        )
        .unwrap();
        let claim_duration = Histogram::with_opts(HistogramOpts::new(
            "reelpool_claim_duration_seconds",
            "End-to-end claim latency",
        ))
        .unwrap();
        let reward_settled_reel = Histogram::with_opts(
            HistogramOpts::new(
                "reelpool_reward_settled_reel",
                "Settled reward amounts in REEL",
            )
            .buckets(vec![0.1, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0]),
        )
        .unwrap();
        let reconciliation_required = IntCounter::new(
            "reelpool_reconciliation_required_total",
            "Settlements confirmed but not recorded in the claim registry",
        )
        .unwrap();

        let videos_registered =
            IntCounter::new("reelpool_videos_registered_total", "Videos registered").unwrap();
        let engagement_events =
            IntCounter::new("reelpool_engagement_events_total", "Engagement updates recorded")
                .unwrap();

        let pool_remaining_reel = IntGauge::new(
            "reelpool_pool_remaining_reel",
            "Whole REEL remaining in the reward pool",
        )
        .unwrap();

        registry.register(Box::new(claims_submitted.clone())).unwrap();
        registry.register(Box::new(claims_settled.clone())).unwrap();
        registry.register(Box::new(claims_failed.clone())).unwrap();
        registry.register(Box::new(claim_duration.clone())).unwrap();
        registry.register(Box::new(reward_settled_reel.clone())).unwrap();
        registry
            .register(Box::new(reconciliation_required.clone()))
            .unwrap();
        registry.register(Box::new(videos_registered.clone())).unwrap();
        registry.register(Box::new(engagement_events.clone())).unwrap();
        registry.register(Box::new(pool_remaining_reel.clone())).unwrap();

        Self {
            registry: Arc::new(registry),
            claims_submitted,
            claims_settled,
            claims_failed,
            claim_duration,
            reward_settled_reel,
            reconciliation_required,
            videos_registered,
            engagement_events,
            pool_remaining_reel,
        }
    }

    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        encoder.encode_to_string(&families).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
