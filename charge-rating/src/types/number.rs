use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Decimal backing every quantity and amount in this crate. Binary floating point never
/// enters the calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub(crate) struct Number(rust_decimal::Decimal);

impl Number {
    pub(crate) const ZERO: Self = Self(rust_decimal::Decimal::ZERO);

    pub(crate) fn is_sign_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub(crate) fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub(crate) fn ceil(self) -> Self {
        Self(self.0.ceil())
    }

    pub(crate) fn round_dp(self, decimals: u32) -> Self {
        Self(self.0.round_dp(decimals))
    }

    pub(crate) fn normalize(self) -> Self {
        Self(self.0.normalize())
    }

    pub(crate) fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(Error::NumericOverflow)
    }

    pub(crate) fn checked_mul(self, other: Self) -> Result<Self> {
        self.0
            .checked_mul(other.0)
            .map(Self)
            .ok_or(Error::NumericOverflow)
    }

    pub(crate) fn checked_div(self, other: Self) -> Result<Self> {
        self.0
            .checked_div(other.0)
            .map(Self)
            .ok_or(Error::NumericOverflow)
    }

    /// Remainder of `self / other`. A zero divisor is a caller bug and reported as overflow.
    pub(crate) fn checked_rem(self, other: Self) -> Result<Self> {
        self.0
            .checked_rem(other.0)
            .map(Self)
            .ok_or(Error::NumericOverflow)
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let decimal = <rust_decimal::Decimal as Deserialize>::deserialize(deserializer)?;
        Ok(Self(decimal))
    }
}

impl From<rust_decimal::Decimal> for Number {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self(value)
    }
}

impl From<Number> for rust_decimal::Decimal {
    fn from(value: Number) -> Self {
        value.0
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self(value.into())
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Self(value.into())
    }
}

impl TryFrom<Number> for i64 {
    type Error = rust_decimal::Error;

    fn try_from(value: Number) -> std::result::Result<Self, Self::Error> {
        value.0.try_into()
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
