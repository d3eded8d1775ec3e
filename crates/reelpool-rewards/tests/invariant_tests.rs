use reelpool_rewards::{
    InProcessLedger, MemoryClaimStore, MemoryEngagementStore, RetryPolicy, RewardCalculator,
    RewardSchedule, RewardsEngine, SettlementLedger,
};
use reelpool_types::{AccountAddress, ClaimError, EngagementSnapshot, ReelAmount, VideoId};
use std::sync::Arc;

fn vid(s: &str) -> VideoId {
    VideoId::new(s).unwrap()
}

fn snapshot(likes: u64, shares: u64, comments: u64) -> EngagementSnapshot {
    EngagementSnapshot::new(vid("v1"), likes, shares, comments)
}

async fn engine_with_video(
    video: &str,
    creator: AccountAddress,
    likes: u64,
    shares: u64,
    comments: u64,
) -> (RewardsEngine, Arc<MemoryEngagementStore>, Arc<InProcessLedger>) {
    let engagement = Arc::new(MemoryEngagementStore::new());
    engagement
        .register_video(vid(video), creator, "reel")
        .await
        .unwrap();
    if likes + shares + comments > 0 {
        engagement
            .record_engagement(&vid(video), likes, shares, comments)
            .await
            .unwrap();
    }

    let ledger = Arc::new(InProcessLedger::new(ReelAmount::from_reel(1_000_000.0)));
    let engine = RewardsEngine::new(
        engagement.clone(),
        ledger.clone(),
        Arc::new(MemoryClaimStore::new()),
        RewardSchedule::default(),
        RetryPolicy::default(),
    );
    (engine, engagement, ledger)
}

/// Reward is monotonically non-decreasing in each counter individually.
#[test]
fn test_reward_monotonicity() {
    let calc = RewardCalculator::default();

    println!("\n=== Testing Reward Monotonicity ===");

    let bases = [
        (0u64, 0u64, 0u64),
        (10, 5, 3),
        (999, 0, 0),
        (1000, 0, 0),
        (123_456, 7_890, 42),
    ];

    for (likes, shares, comments) in bases {
        let base = calc.compute(&snapshot(likes, shares, comments));
        for k in [1u64, 7, 1000, 1_000_000] {
            assert!(calc.compute(&snapshot(likes + k, shares, comments)) >= base);
            assert!(calc.compute(&snapshot(likes, shares + k, comments)) >= base);
            assert!(calc.compute(&snapshot(likes, shares, comments + k)) >= base);
        }
    }
    println!("✓ Monotone in likes, shares and comments");
}

/// The viral bonus fires at exactly 1000 likes, once.
#[test]
fn test_viral_threshold_exactness() {
    let calc = RewardCalculator::default();

    let below = calc.compute(&snapshot(999, 0, 0));
    let at = calc.compute(&snapshot(1000, 0, 0));

    assert_eq!(below, ReelAmount::from_base_units(99_900_000_000_000_000_000));
    assert_eq!(at, ReelAmount::from_reel(150.0));

    // The step across the threshold is bonus + one like, no more.
    let step = at.checked_sub(below).unwrap();
    let expected = RewardSchedule::default()
        .viral_bonus
        .saturating_add(RewardSchedule::default().like_rate);
    assert_eq!(step, expected);
    println!("✓ Bonus fires at >= 1000 likes, exactly once");
}

/// Two concurrent claims for the same unclaimed video: exactly one success,
/// one AlreadyClaimed, one settlement on the ledger.
#[tokio::test]
async fn test_concurrent_claims_settle_once() {
    let creator = AccountAddress::from_bytes([5; 20]);

    println!("\n=== Testing Concurrent Claim Idempotence ===");

    for round in 0..10 {
        let (engine, _engagement, ledger) = engine_with_video("v1", creator, 10, 5, 3).await;
        let orchestrator = engine.orchestrator.clone();

        let a = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.claim(&vid("v1"), creator).await })
        };
        let b = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.claim(&vid("v1"), creator).await })
        };

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
        let already = [&ra, &rb]
            .iter()
            .filter(|r| matches!(r, Err(ClaimError::AlreadyClaimed)))
            .count();

        assert_eq!(successes, 1, "round {}: exactly one success", round);
        assert_eq!(already, 1, "round {}: exactly one AlreadyClaimed", round);
        assert_eq!(ledger.settlement_count().await, 1);
        assert_eq!(
            ledger.balance_of(creator).await.unwrap(),
            ReelAmount::from_base_units(4_100_000_000_000_000_000)
        );
    }
    println!("✓ One success, one AlreadyClaimed, one settlement (10 rounds)");
}

/// A settled record keeps the amount computed at claim time even when
/// engagement keeps growing.
#[tokio::test]
async fn test_settled_amount_is_frozen() {
    let creator = AccountAddress::from_bytes([6; 20]);
    let (engine, engagement, _ledger) = engine_with_video("v1", creator, 10, 5, 3).await;

    let receipt = engine.orchestrator.claim(&vid("v1"), creator).await.unwrap();
    let claimed_amount = receipt.amount;

    // Engagement keeps accumulating after the claim.
    engagement
        .record_engagement(&vid("v1"), 10_000, 500, 300)
        .await
        .unwrap();

    let record = engine.registry.get_record(&vid("v1")).await.unwrap().unwrap();
    assert!(record.settled);
    assert_eq!(record.amount, claimed_amount);
    assert_eq!(record.settlement_ref.as_deref(), Some(receipt.settlement_ref.as_str()));

    // And the claim stays closed.
    let err = engine.orchestrator.claim(&vid("v1"), creator).await.unwrap_err();
    assert!(matches!(err, ClaimError::AlreadyClaimed));
    println!("✓ Settled amount immutable under later engagement changes");
}

/// Zero engagement never reaches settlement.
#[tokio::test]
async fn test_zero_reward_rejected_before_settlement() {
    let creator = AccountAddress::from_bytes([7; 20]);
    let (engine, _engagement, ledger) = engine_with_video("v1", creator, 0, 0, 0).await;

    let err = engine.orchestrator.claim(&vid("v1"), creator).await.unwrap_err();
    assert!(matches!(err, ClaimError::NoReward));

    assert_eq!(ledger.settlement_count().await, 0);
    assert!(!engine.registry.is_settled(&vid("v1")).await.unwrap());
    println!("✓ Zero-reward claim rejected with no settlement attempt");
}

/// The orchestrator never holds claim state across videos: claims on
/// distinct videos are independent.
#[tokio::test]
async fn test_claims_are_per_video() {
    let creator = AccountAddress::from_bytes([8; 20]);
    let engagement = Arc::new(MemoryEngagementStore::new());
    for name in ["v1", "v2", "v3"] {
        engagement
            .register_video(vid(name), creator, name)
            .await
            .unwrap();
        engagement
            .record_engagement(&vid(name), 10, 0, 0)
            .await
            .unwrap();
    }

    let ledger = Arc::new(InProcessLedger::new(ReelAmount::from_reel(1_000.0)));
    let engine = RewardsEngine::new(
        engagement,
        ledger.clone(),
        Arc::new(MemoryClaimStore::new()),
        RewardSchedule::default(),
        RetryPolicy::default(),
    );

    for name in ["v1", "v2", "v3"] {
        engine.orchestrator.claim(&vid(name), creator).await.unwrap();
    }
    assert_eq!(ledger.settlement_count().await, 3);
    assert_eq!(
        ledger.balance_of(creator).await.unwrap(),
        ReelAmount::from_reel(3.0)
    );
}
