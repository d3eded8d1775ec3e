use proptest::prelude::*;
use reelpool_rewards::{
    InProcessLedger, MemoryClaimStore, MemoryEngagementStore, RetryPolicy, RewardCalculator,
    RewardSchedule, RewardsEngine, SettlementLedger,
};
use reelpool_types::{AccountAddress, ClaimError, EngagementSnapshot, ReelAmount, VideoId};
use std::sync::Arc;

fn snapshot(likes: u64, shares: u64, comments: u64) -> EngagementSnapshot {
    EngagementSnapshot::new(VideoId::new("vid").unwrap(), likes, shares, comments)
}

prop_compose! {
    fn arb_counters()
        (likes in 0u64..10_000_000, shares in 0u64..10_000_000, comments in 0u64..10_000_000)
        -> (u64, u64, u64) {
        (likes, shares, comments)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // In the range where nothing saturates the reward matches the schedule
    // formula computed independently in u128.
    #[test]
    fn prop_reward_matches_formula((likes, shares, comments) in arb_counters()) {
        let calc = RewardCalculator::default();
        let schedule = RewardSchedule::default();

        let mut expected = schedule.like_rate.to_base_units() * likes as u128
            + schedule.share_rate.to_base_units() * shares as u128
            + schedule.comment_rate.to_base_units() * comments as u128;
        if likes >= schedule.viral_threshold {
            expected += schedule.viral_bonus.to_base_units();
        }

        prop_assert_eq!(
            calc.compute(&snapshot(likes, shares, comments)),
            ReelAmount::from_base_units(expected)
        );
    }

    #[test]
    fn prop_reward_monotone_in_each_counter(
        (likes, shares, comments) in arb_counters(),
        delta in 1u64..1_000_000,
    ) {
        let calc = RewardCalculator::default();
        let base = calc.compute(&snapshot(likes, shares, comments));

        prop_assert!(calc.compute(&snapshot(likes + delta, shares, comments)) >= base);
        prop_assert!(calc.compute(&snapshot(likes, shares + delta, comments)) >= base);
        prop_assert!(calc.compute(&snapshot(likes, shares, comments + delta)) >= base);
    }

    #[test]
    fn prop_reward_total_for_any_counters(
        likes in any::<u64>(),
        shares in any::<u64>(),
        comments in any::<u64>(),
    ) {
        let calc = RewardCalculator::default();
        // Never panics, never exceeds max supply.
        let reward = calc.compute(&snapshot(likes, shares, comments));
        prop_assert!(reward <= ReelAmount::MAX_SUPPLY);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Whatever the counters, a claim settles at most once and pays exactly
    // the calculator output.
    #[test]
    fn prop_claim_pays_computed_amount_once((likes, shares, comments) in arb_counters()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let creator = AccountAddress::from_bytes([42; 20]);
            let video = VideoId::new("vid").unwrap();

            let engagement = Arc::new(MemoryEngagementStore::new());
            engagement.register_video(video.clone(), creator, "reel").await.unwrap();
            if likes + shares + comments > 0 {
                engagement
                    .record_engagement(&video, likes, shares, comments)
                    .await
                    .unwrap();
            }

            let ledger = Arc::new(InProcessLedger::new(ReelAmount::MAX_SUPPLY));
            let engine = RewardsEngine::new(
                engagement,
                ledger.clone(),
                Arc::new(MemoryClaimStore::new()),
                RewardSchedule::default(),
                RetryPolicy::default(),
            );

            let expected = engine.orchestrator.calculator().compute(
                &snapshot(likes, shares, comments),
            );

            match engine.orchestrator.claim(&video, creator).await {
                Ok(receipt) => {
                    prop_assert_eq!(receipt.amount, expected);
                    prop_assert_eq!(ledger.balance_of(creator).await.unwrap(), expected);
                    prop_assert_eq!(ledger.settlement_count().await, 1);

                    let second = engine.orchestrator.claim(&video, creator).await;
                    prop_assert!(matches!(second, Err(ClaimError::AlreadyClaimed)));
                    prop_assert_eq!(ledger.settlement_count().await, 1);
                }
                Err(ClaimError::NoReward) => {
                    prop_assert!(expected.is_zero());
                    prop_assert_eq!(ledger.settlement_count().await, 0);
                }
                Err(other) => return Err(TestCaseError::fail(format!("unexpected: {}", other))),
            }
            Ok(())
        })?;
    }
}
