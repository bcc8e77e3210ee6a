// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demand type for backpressure.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// The number of values a subscriber has committed to accept.
///
/// Demand only grows through requests and shrinks as values are delivered.
/// Arithmetic saturates: adding past `u64::MAX` yields [`Demand::Unlimited`],
/// and subtracting never goes below zero.
///
/// # Examples
///
/// ```
/// use wac_accessory::reactive::Demand;
///
/// let demand = Demand::max(2) + Demand::max(3);
/// assert_eq!(demand, Demand::max(5));
/// assert_eq!(demand - 10, Demand::NONE);
/// assert!(Demand::Unlimited > Demand::max(u64::MAX));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Demand {
    /// A finite number of values.
    Finite(u64),
    /// No limit on the number of values.
    Unlimited,
}

impl Demand {
    /// No demand at all.
    pub const NONE: Self = Self::Finite(0);

    /// Creates a finite demand for at most `count` values.
    #[must_use]
    pub const fn max(count: u64) -> Self {
        Self::Finite(count)
    }

    /// Returns `true` if the demand is unlimited.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Returns `true` if at least one more value may be delivered.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Finite(count) => *count > 0,
        }
    }

    /// Returns the finite count, or `None` for unlimited demand.
    #[must_use]
    pub const fn count(&self) -> Option<u64> {
        match self {
            Self::Finite(count) => Some(*count),
            Self::Unlimited => None,
        }
    }
}

impl Default for Demand {
    fn default() -> Self {
        Self::NONE
    }
}

impl PartialOrd for Demand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Demand {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Unlimited, Self::Unlimited) => Ordering::Equal,
            (Self::Unlimited, Self::Finite(_)) => Ordering::Greater,
            (Self::Finite(_), Self::Unlimited) => Ordering::Less,
            (Self::Finite(a), Self::Finite(b)) => a.cmp(b),
        }
    }
}

impl Add for Demand {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Finite(a), Self::Finite(b)) => a.checked_add(b).map_or(Self::Unlimited, Self::Finite),
            _ => Self::Unlimited,
        }
    }
}

impl AddAssign for Demand {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Add<u64> for Demand {
    type Output = Self;

    fn add(self, rhs: u64) -> Self {
        self + Self::Finite(rhs)
    }
}

impl Sub<u64> for Demand {
    type Output = Self;

    fn sub(self, rhs: u64) -> Self {
        match self {
            Self::Unlimited => Self::Unlimited,
            Self::Finite(count) => Self::Finite(count.saturating_sub(rhs)),
        }
    }
}

impl SubAssign<u64> for Demand {
    fn sub_assign(&mut self, rhs: u64) {
        *self = *self - rhs;
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(count) => write!(f, "max({count})"),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_not_positive() {
        assert!(!Demand::NONE.is_positive());
        assert!(Demand::max(1).is_positive());
        assert!(Demand::Unlimited.is_positive());
    }

    #[test]
    fn addition_saturates_to_unlimited() {
        assert_eq!(Demand::max(u64::MAX) + 1, Demand::Unlimited);
        assert_eq!(Demand::Unlimited + Demand::max(3), Demand::Unlimited);
    }

    #[test]
    fn subtraction_saturates_at_zero() {
        assert_eq!(Demand::max(2) - 5, Demand::NONE);
        assert_eq!(Demand::Unlimited - 5, Demand::Unlimited);
    }

    #[test]
    fn unlimited_orders_above_finite() {
        assert!(Demand::Unlimited > Demand::max(u64::MAX));
        assert!(Demand::max(1) > Demand::NONE);
    }

    #[test]
    fn display() {
        assert_eq!(Demand::max(4).to_string(), "max(4)");
        assert_eq!(Demand::Unlimited.to_string(), "unlimited");
    }
}
