//! Share amounts — the ledger's smallest accounting unit.
//!
//! Amounts are signed 64-bit integers ("shares") to match the signed
//! quantities the maintenance engine produces (budget supply deltas and
//! dividend deltas can be negative). All intermediate products are widened
//! to 128 bits; no floating point anywhere.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Maximum core-asset share supply. The reserve pool is
/// `MAX_CORE_SUPPLY - current_supply`.
pub const MAX_CORE_SUPPLY: Shares = Shares(1_000_000_000_000_000);

/// A signed share amount.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Shares(i64);

impl Shares {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Non-negative magnitude as `u128`, for 128-bit product math.
    /// Negative amounts widen to 0.
    pub fn to_u128(&self) -> u128 {
        if self.0 < 0 {
            0
        } else {
            self.0 as u128
        }
    }

    /// Narrow a 128-bit intermediate result back to a share amount.
    /// `None` if the value exceeds `i64::MAX`.
    pub fn try_from_u128(value: u128) -> Option<Self> {
        i64::try_from(value).ok().map(Self)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

impl Add for Shares {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Shares {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Shares {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Shares {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Shares {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Shares {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl fmt::Display for Shares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amounts_widen_to_zero() {
        assert_eq!(Shares::new(-5).to_u128(), 0);
        assert_eq!(Shares::new(5).to_u128(), 5);
    }

    #[test]
    fn narrow_rejects_oversized_values() {
        assert_eq!(Shares::try_from_u128(u128::MAX), None);
        assert_eq!(Shares::try_from_u128(42), Some(Shares::new(42)));
    }
}
