use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::number::Number;
use crate::Result;

/// A monetary amount in the currency of the tariff model. Amounts produced by the rater are
/// never rounded; rounding belongs to invoicing.
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Money(Number);

impl Money {
    pub(crate) fn zero() -> Self {
        Self(Number::ZERO)
    }

    /// Whether this amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        !self.0.is_zero() && !self.0.is_sign_negative()
    }

    /// Round to `decimals` places using banker's rounding, for presentation only.
    #[must_use]
    pub fn rounded(self, decimals: u32) -> Self {
        Self(self.0.round_dp(decimals))
    }

    /// Strip trailing zeros, for presentation only.
    #[must_use]
    pub fn normalize(self) -> Self {
        Self(self.0.normalize())
    }

    pub(crate) fn checked_add(self, other: Self) -> Result<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// The amount owed for `units` of something priced at `self` per unit.
    pub(crate) fn checked_times(self, units: Number) -> Result<Self> {
        self.0.checked_mul(units).map(Self)
    }
}

impl From<rust_decimal::Decimal> for Money {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self(value.into())
    }
}

impl From<Money> for rust_decimal::Decimal {
    fn from(value: Money) -> Self {
        value.0.into()
    }
}

impl From<Number> for Money {
    fn from(value: Number) -> Self {
        Self(value)
    }
}

impl From<Money> for Number {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}
