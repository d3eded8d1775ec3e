use crate::error::ClaimError;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_VIDEO_ID_LEN: usize = 64;

/// Identifier assigned to a video by the platform's metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Result<Self, ClaimError> {
        let id = id.into();
        if id.is_empty() || id.len() > MAX_VIDEO_ID_LEN {
            return Err(ClaimError::InvalidVideoId(format!(
                "length must be 1..={}",
                MAX_VIDEO_ID_LEN
            )));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ClaimError::InvalidVideoId(
                "only alphanumeric, '-' and '_' allowed".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(VideoId::new("vid_001").is_ok());
        assert!(VideoId::new("aB3-xY9").is_ok());
    }

    #[test]
    fn test_invalid_ids() {
        assert!(VideoId::new("").is_err());
        assert!(VideoId::new("has space").is_err());
        assert!(VideoId::new("x".repeat(65)).is_err());
    }
}
