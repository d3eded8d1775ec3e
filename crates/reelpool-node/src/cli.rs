use crate::config::NodeConfig;
use crate::node::RewardsNode;
use anyhow::Result;
use reelpool_types::{AccountAddress, VideoId};
use tracing::info;

/// Run a local end-to-end demo: register a video, record engagement, claim.
pub async fn run_local_demo() -> Result<()> {
    info!("Running local claim demo");

    let config = NodeConfig::default();
    let node = RewardsNode::new(config)?;

    let creator = AccountAddress::from_bytes([0x11; 20]);
    let video_id = VideoId::new("demo-reel-001")?;

    node.register_video(video_id.clone(), creator, "Demo reel")
        .await?;
    node.record_engagement(&video_id, 10, 5, 3).await?;

    let preview = node.preview_reward(&video_id).await?;
    info!("Preview reward: {}", preview);

    let receipt = node.claim(&video_id, creator).await?;
    info!(
        amount = %receipt.amount,
        settlement_ref = %receipt.settlement_ref,
        "Claim settled"
    );

    let balance = node.balance_of(creator).await?;
    info!("Creator balance: {}", balance);

    // A second claim must be refused.
    match node.claim(&video_id, creator).await {
        Err(e) => info!("Second claim refused as expected: {}", e),
        Ok(_) => anyhow::bail!("Second claim unexpectedly succeeded"),
    }

    let stats = node.get_stats().await;
    info!(
        videos = stats.videos,
        settlements = stats.settlements,
        pool_remaining = %stats.pool_remaining,
        "Demo complete"
    );

    Ok(())
}
