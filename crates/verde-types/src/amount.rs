use serde::{Deserialize, Serialize};
use std::fmt;

pub const CREDIT_DECIMALS: u32 = 6;
pub const CREDIT_BASE_UNIT: u64 = 1_000_000; // 10^6

/// Token amount in base units. One carbon credit is 10^6 base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CreditAmount(u64);

impl CreditAmount {
    pub const ZERO: Self = Self(0);

    pub fn from_credits(credits: f64) -> Self {
        Self((credits * CREDIT_BASE_UNIT as f64) as u64)
    }

    pub fn from_base_units(units: u64) -> Self {
        Self(units)
    }

    pub fn to_credits(&self) -> f64 {
        self.0 as f64 / CREDIT_BASE_UNIT as f64
    }

    pub fn to_base_units(&self) -> u64 {
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

    pub fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for CreditAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} VCC", self.to_credits())
    }
}
