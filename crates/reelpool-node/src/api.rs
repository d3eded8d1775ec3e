use crate::metrics::Metrics;
use crate::node::{NodeStats, RewardsNode};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use reelpool_types::{AccountAddress, ClaimError, VideoId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    node: Arc<RewardsNode>,
    metrics: Metrics,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
    kind: String,
}

#[derive(Serialize, Deserialize)]
pub struct ClaimRequest {
    pub video_id: String,
    pub address: String,
}

#[derive(Serialize, Deserialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub amount: String,
    pub amount_base_units: String,
    pub settlement_ref: String,
    pub settled_at: i64,
}

#[derive(Serialize, Deserialize)]
pub struct ClaimRecordResponse {
    pub video_id: String,
    pub settled: bool,
    pub amount: String,
    pub settlement_ref: Option<String>,
    pub settled_at: Option<i64>,
}

#[derive(Serialize, Deserialize)]
pub struct PreviewResponse {
    pub video_id: String,
    pub amount: String,
    pub amount_base_units: String,
}

#[derive(Serialize, Deserialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: String,
    pub decimals: u32,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterVideoRequest {
    pub video_id: String,
    pub creator: String,
    pub title: String,
}

#[derive(Serialize, Deserialize)]
pub struct EngagementRequest {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub comments: u64,
}

#[derive(Serialize, Deserialize)]
pub struct VideoResponse {
    pub video_id: String,
    pub creator: String,
    pub title: String,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub claimed: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn claim_error_response(e: &ClaimError) -> ApiError {
    let status = match e {
        ClaimError::NotFound(_) => StatusCode::NOT_FOUND,
        ClaimError::Unauthorized => StatusCode::FORBIDDEN,
        ClaimError::AlreadyClaimed
        | ClaimError::NoReward
        | ClaimError::InvalidVideoId(_)
        | ClaimError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        ClaimError::InsufficientFunds(_)
        | ClaimError::Rejected(_)
        | ClaimError::Unreachable(_)
        | ClaimError::Unknown(_) => StatusCode::BAD_GATEWAY,
        ClaimError::ReconciliationRequired { .. }
        | ClaimError::Storage(_)
        | ClaimError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            kind: e.kind().to_string(),
        }),
    )
}

fn bad_request(e: ClaimError) -> ApiError {
    claim_error_response(&e)
}

pub fn start_api_server(node: Arc<RewardsNode>, host: String, port: u16) -> JoinHandle<()> {
    let metrics = Metrics::new();
    let state = AppState { node, metrics };

    let app = router(state);
    let addr = format!("{}:{}", host, port);
    info!("📡 Starting API server on {}", addr);

    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind API server");

        axum::serve(listener, app).await.expect("API server failed");
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(get_status))
        .route("/v1/rewards/claim", post(claim_rewards))
        .route("/v1/rewards/claim/:video_id", get(get_claim_record))
        .route("/v1/rewards/preview/:video_id", get(preview_reward))
        .route("/v1/rewards/balance/:address", get(get_balance))
        .route("/v1/videos", post(register_video))
        .route("/v1/videos/:video_id", get(get_video))
        .route("/v1/videos/:video_id/engagement", post(record_engagement))
        .route("/metrics", get(get_metrics))
        .with_state(Arc::new(state))
}

async fn health() -> &'static str {
    "OK"
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<NodeStats> {
    Json(state.node.get_stats().await)
}

async fn claim_rewards(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    state.metrics.claims_submitted.inc();
    let started = Instant::now();

    let video_id = VideoId::new(req.video_id).map_err(bad_request)?;
    let address = AccountAddress::from_hex(&req.address).map_err(bad_request)?;

    match state.node.claim(&video_id, address).await {
        Ok(receipt) => {
            state.metrics.claims_settled.inc();
            state
                .metrics
                .claim_duration
                .observe(started.elapsed().as_secs_f64());
            state
                .metrics
                .reward_settled_reel
                .observe(receipt.amount.to_reel());
            state
                .metrics
                .pool_remaining_reel
                .set(state.node.pool_remaining().await.to_reel() as i64);

            Ok(Json(ClaimResponse {
                success: true,
                amount: receipt.amount.to_string(),
                amount_base_units: receipt.amount.to_base_units().to_string(),
                settlement_ref: receipt.settlement_ref,
                settled_at: receipt.settled_at,
            }))
        }
        Err(e) => {
            state.metrics.claims_failed.with_label_values(&[e.kind()]).inc();
            if matches!(e, ClaimError::ReconciliationRequired { .. }) {
                state.metrics.reconciliation_required.inc();
            }
            Err(claim_error_response(&e))
        }
    }
}

async fn get_claim_record(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<ClaimRecordResponse>, ApiError> {
    let video_id = VideoId::new(video_id).map_err(bad_request)?;

    let record = state.node.get_claim_record(&video_id).await.map_err(|e| {
        error!("Failed to read claim record: {}", e);
        claim_error_response(&ClaimError::Storage(e.to_string()))
    })?;

    match record {
        Some(record) => Ok(Json(ClaimRecordResponse {
            video_id: record.video_id.to_string(),
            settled: record.settled,
            amount: record.amount.to_string(),
            settlement_ref: record.settlement_ref,
            settled_at: record.settled_at,
        })),
        None => Ok(Json(ClaimRecordResponse {
            video_id: video_id.to_string(),
            settled: false,
            amount: reelpool_types::ReelAmount::ZERO.to_string(),
            settlement_ref: None,
            settled_at: None,
        })),
    }
}

async fn preview_reward(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let video_id = VideoId::new(video_id).map_err(bad_request)?;
    let amount = state
        .node
        .preview_reward(&video_id)
        .await
        .map_err(|e| claim_error_response(&e))?;

    Ok(Json(PreviewResponse {
        video_id: video_id.to_string(),
        amount: amount.to_string(),
        amount_base_units: amount.to_base_units().to_string(),
    }))
}

async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let address = AccountAddress::from_hex(&address).map_err(bad_request)?;
    let balance = state
        .node
        .balance_of(address)
        .await
        .map_err(|e| claim_error_response(&e))?;

    Ok(Json(BalanceResponse {
        address: address.to_string(),
        balance: balance.to_string(),
        decimals: reelpool_types::REEL_DECIMALS,
    }))
}

async fn register_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterVideoRequest>,
) -> Result<Json<VideoResponse>, ApiError> {
    let video_id = VideoId::new(req.video_id).map_err(bad_request)?;
    let creator = AccountAddress::from_hex(&req.creator).map_err(bad_request)?;

    let meta = state
        .node
        .register_video(video_id, creator, req.title)
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                    kind: "registration".to_string(),
                }),
            )
        })?;

    state.metrics.videos_registered.inc();

    Ok(Json(VideoResponse {
        video_id: meta.video_id.to_string(),
        creator: meta.creator.to_string(),
        title: meta.title,
        likes: 0,
        shares: 0,
        comments: 0,
        claimed: false,
    }))
}

async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoResponse>, ApiError> {
    let video_id = VideoId::new(video_id).map_err(bad_request)?;

    let meta = state
        .node
        .get_video(&video_id)
        .await
        .ok_or_else(|| claim_error_response(&ClaimError::NotFound(video_id.to_string())))?;

    let snapshot = state
        .node
        .get_snapshot(&video_id)
        .await
        .map_err(|e| claim_error_response(&ClaimError::Storage(e.to_string())))?
        .ok_or_else(|| claim_error_response(&ClaimError::NotFound(video_id.to_string())))?;

    let claimed = state
        .node
        .get_claim_record(&video_id)
        .await
        .map_err(|e| claim_error_response(&ClaimError::Storage(e.to_string())))?
        .map(|r| r.settled)
        .unwrap_or(false);

    Ok(Json(VideoResponse {
        video_id: meta.video_id.to_string(),
        creator: meta.creator.to_string(),
        title: meta.title,
        likes: snapshot.likes,
        shares: snapshot.shares,
        comments: snapshot.comments,
        claimed,
    }))
}

async fn record_engagement(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Json(req): Json<EngagementRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let video_id = VideoId::new(video_id).map_err(bad_request)?;

    let snapshot = state
        .node
        .record_engagement(&video_id, req.likes, req.shares, req.comments)
        .await
        .map_err(|e| claim_error_response(&ClaimError::NotFound(e.to_string())))?;

    state.metrics.engagement_events.inc();

    Ok(Json(serde_json::json!({
        "video_id": snapshot.video_id.to_string(),
        "likes": snapshot.likes,
        "shares": snapshot.shares,
        "comments": snapshot.comments,
    })))
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.gather()
}
