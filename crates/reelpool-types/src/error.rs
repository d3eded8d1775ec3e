use thiserror::Error;

/// Claim outcome taxonomy.
///
/// The first four variants are terminal and reported to the caller without
/// retry. `Unreachable` may be retried with backoff under the claim's
/// idempotency key. `InsufficientFunds` and `Rejected` end the current
/// attempt but may succeed on a later claim. `ReconciliationRequired` marks a
/// confirmed settlement the registry failed to record; it is surfaced to the
/// alert path and never retried automatically.
#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Requester is not the video creator")]
    Unauthorized,

    #[error("Rewards already claimed for this video")]
    AlreadyClaimed,

    #[error("No rewards to claim yet")]
    NoReward,

    #[error("Insufficient funds to settle reward: {0}")]
    InsufficientFunds(String),

    #[error("Settlement rejected by ledger: {0}")]
    Rejected(String),

    #[error("Settlement ledger unreachable: {0}")]
    Unreachable(String),

    #[error("Settlement outcome unknown: {0}")]
    Unknown(String),

    #[error("Settlement {settlement_ref} confirmed but claim record write failed: {reason}")]
    ReconciliationRequired {
        settlement_ref: String,
        reason: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClaimError {
    /// Stable identifier reported in API responses and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ClaimError::NotFound(_) => "not_found",
            ClaimError::Unauthorized => "unauthorized",
            ClaimError::AlreadyClaimed => "already_claimed",
            ClaimError::NoReward => "no_reward",
            ClaimError::InsufficientFunds(_) => "insufficient_funds",
            ClaimError::Rejected(_) => "rejected",
            ClaimError::Unreachable(_) => "unreachable",
            ClaimError::Unknown(_) => "unknown",
            ClaimError::ReconciliationRequired { .. } => "reconciliation_required",
            ClaimError::Storage(_) => "storage",
            ClaimError::InvalidVideoId(_) => "invalid_video_id",
            ClaimError::InvalidAddress(_) => "invalid_address",
            ClaimError::Configuration(_) => "configuration",
        }
    }
}

impl From<serde_json::Error> for ClaimError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClaimError>;
