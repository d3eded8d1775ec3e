pub mod amount;
pub mod address;
pub mod engagement;
pub mod error;
pub mod id;

pub use address::AccountAddress;
pub use amount::{ReelAmount, REEL_BASE_UNIT, REEL_DECIMALS};
pub use engagement::EngagementSnapshot;
pub use error::{ClaimError, Result};
pub use id::VideoId;
