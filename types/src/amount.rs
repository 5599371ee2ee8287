//! Coin amount type.
//!
//! Amounts are non-negative integers in the smallest coin unit. Stored as
//! `u64` with checked arithmetic so ledger math cannot silently wrap.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A coin amount in raw units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_detects_overflow() {
        let a = Amount::new(u64::MAX);
        assert!(a.checked_add(Amount::new(1)).is_none());
        assert_eq!(
            Amount::new(2).checked_add(Amount::new(3)),
            Some(Amount::new(5))
        );
    }

    #[test]
    fn checked_sub_detects_underflow() {
        assert!(Amount::new(1).checked_sub(Amount::new(2)).is_none());
        assert_eq!(
            Amount::new(5).checked_sub(Amount::new(3)),
            Some(Amount::new(2))
        );
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&Amount::new(40)).unwrap();
        assert_eq!(json, "40");
        let back: Amount = serde_json::from_str("40").unwrap();
        assert_eq!(back, Amount::new(40));
    }
}
