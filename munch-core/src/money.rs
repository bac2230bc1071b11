//! Money amounts held in minor units (paise).
//!
//! Storage and order records carry plain JSON numbers in major units, so the
//! serde representation converts on the way in and out.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

const MINOR_PER_MAJOR: i64 = 100;
const BASIS_POINTS: i64 = 10_000;

/// A non-negative amount of money in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    /// Build from minor units; negative input clamps to zero.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        if minor < 0 { Self(0) } else { Self(minor) }
    }

    /// Build from a major-unit number, rounding to the nearest minor unit.
    /// Non-finite or negative values become zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_major(major: f64) -> Self {
        if !major.is_finite() || major <= 0.0 {
            return Self::ZERO;
        }
        let minor = (major * 100.0).round();
        if minor >= i64::MAX as f64 {
            Self(i64::MAX)
        } else {
            Self(minor as i64)
        }
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// Apply a rate expressed in basis points, rounding half up.
    #[must_use]
    pub const fn rate_bp(self, basis_points: u32) -> Self {
        let scaled = self.0.saturating_mul(basis_points as i64);
        Self((scaled + BASIS_POINTS / 2) / BASIS_POINTS)
    }

    /// Render with a currency symbol and two decimals, e.g. `₹210.00`.
    #[must_use]
    pub fn display_with(self, symbol: &str) -> String {
        format!(
            "{symbol}{}.{:02}",
            self.0 / MINOR_PER_MAJOR,
            self.0 % MINOR_PER_MAJOR
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / MINOR_PER_MAJOR, self.0 % MINOR_PER_MAJOR)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_PER_MAJOR == 0 {
            serializer.serialize_i64(self.0 / MINOR_PER_MAJOR)
        } else {
            serializer.serialize_f64(self.to_major())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let major = f64::deserialize(deserializer)?;
        Ok(Self::from_major(major))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_conversion_rounds_to_nearest_paisa() {
        assert_eq!(Money::from_major(250.0).minor(), 25_000);
        assert_eq!(Money::from_major(99.995).minor(), 10_000);
        assert_eq!(Money::from_major(-3.0), Money::ZERO);
        assert_eq!(Money::from_major(f64::NAN), Money::ZERO);
    }

    #[test]
    fn five_percent_tax_rounds_half_up() {
        assert_eq!(Money::from_major(200.0).rate_bp(500), Money::from_major(10.0));
        // 0.10 * 5% = 0.005 -> rounds to 0.01
        assert_eq!(Money::from_minor(10).rate_bp(500), Money::from_minor(1));
        assert_eq!(Money::from_minor(9).rate_bp(500), Money::ZERO);
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::from_major(210.0).display_with("₹"), "₹210.00");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
    }

    #[test]
    fn serializes_whole_amounts_as_integers() {
        assert_eq!(serde_json::to_string(&Money::from_major(250.0)).unwrap(), "250");
        assert_eq!(serde_json::to_string(&Money::from_major(99.5)).unwrap(), "99.5");
        let parsed: Money = serde_json::from_str("12.34").unwrap();
        assert_eq!(parsed.minor(), 1234);
    }
}
