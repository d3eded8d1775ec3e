use crate::error::ClaimError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte settlement-ledger account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountAddress([u8; 20]);

impl AccountAddress {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, ClaimError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|e| ClaimError::InvalidAddress(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(ClaimError::InvalidAddress(format!(
                "expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes);
        Ok(Self(addr))
    }

    /// Reserved address the in-process ledger settles rewards from.
    pub fn reward_pool() -> Self {
        Self([0u8; 20])
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
