use serde::{Deserialize, Serialize};
use std::fmt;

pub const REEL_DECIMALS: u32 = 18;
pub const REEL_BASE_UNIT: u128 = 1_000_000_000_000_000_000; // 10^18

/// A non-negative REEL quantity in base units of 10^-18 token.
///
/// u128 so that a per-event rate (10^18-scaled) multiplied by a u64
/// engagement counter cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReelAmount(u128);

impl ReelAmount {
    pub const ZERO: Self = Self(0);
    pub const MAX_SUPPLY: Self = Self(1_000_000_000 * REEL_BASE_UNIT); // 10^9 REEL

    pub fn from_reel(reel: f64) -> Self {
        Self((reel * REEL_BASE_UNIT as f64) as u128)
    }

    pub fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    pub fn to_reel(&self) -> f64 {
        self.0 as f64 / REEL_BASE_UNIT as f64
    }

    pub fn to_base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Scale a per-event rate by an engagement counter.
    pub fn checked_scale(&self, count: u64) -> Option<Self> {
        self.0.checked_mul(count as u128).map(Self)
    }

    pub fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0).min(Self::MAX_SUPPLY.0))
    }

    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn saturating_scale(&self, count: u64) -> Self {
        Self(
            self.0
                .saturating_mul(count as u128)
                .min(Self::MAX_SUPPLY.0),
        )
    }
}

impl fmt::Display for ReelAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / REEL_BASE_UNIT;
        let frac = self.0 % REEL_BASE_UNIT;
        if frac == 0 {
            write!(f, "{} REEL", whole)
        } else {
            let digits = format!("{:018}", frac);
            write!(f, "{}.{} REEL", whole, digits.trim_end_matches('0'))
        }
    }
}
