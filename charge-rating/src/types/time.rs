use std::fmt::Display;

use chrono::Duration;
use serde::{Deserialize, Serialize, Serializer};

use super::number::Number;
use crate::{Error, Result};

const SECS_IN_MIN: i64 = 60;
const MINS_IN_HOUR: i64 = 60;
const SECS_IN_HOUR: i64 = SECS_IN_MIN * MINS_IN_HOUR;

/// A `chrono` UTC date time.
pub type DateTime = chrono::DateTime<chrono::Utc>;

/// A duration that converts from and to a decimal amount of hours, the unit the time
/// dimensions are priced in.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct HoursDecimal(Duration);

impl<'de> Deserialize<'de> for HoursDecimal {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as DeError;

        let hours = Number::deserialize(deserializer)?;
        Self::from_hours_number(hours).map_err(DeError::custom)
    }
}

impl Serialize for HoursDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_num_hours_number().serialize(serializer)
    }
}

impl Display for HoursDecimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let duration = self.0;
        let seconds = duration.num_seconds() % SECS_IN_MIN;
        let minutes = (duration.num_seconds() / SECS_IN_MIN) % MINS_IN_HOUR;
        let hours = duration.num_seconds() / SECS_IN_HOUR;

        write!(f, "{hours:0>2}:{minutes:0>2}:{seconds:0>2}")
    }
}

impl From<HoursDecimal> for Duration {
    fn from(value: HoursDecimal) -> Self {
        value.0
    }
}

impl From<SecondsRound> for HoursDecimal {
    fn from(value: SecondsRound) -> Self {
        Self(value.0)
    }
}

impl HoursDecimal {
    #[must_use]
    pub fn zero() -> Self {
        Self(Duration::zero())
    }

    /// Convert into decimal representation.
    #[must_use]
    pub fn as_num_hours_decimal(&self) -> rust_decimal::Decimal {
        self.as_num_hours_number().into()
    }

    pub(crate) fn as_num_seconds_number(&self) -> Number {
        Number::from(self.0.num_seconds())
    }

    pub(crate) fn as_num_hours_number(&self) -> Number {
        self.as_num_seconds_number()
            .checked_div(Number::from(SECS_IN_HOUR))
            .unwrap_or_else(|_| unreachable!("divisor is non-zero"))
    }

    pub(crate) fn from_seconds_number(seconds: Number) -> Result<Self> {
        let seconds: i64 = seconds.try_into()?;
        Duration::try_seconds(seconds)
            .map(Self)
            .ok_or(Error::NumericOverflow)
    }

    pub(crate) fn from_hours_number(hours: Number) -> Result<Self> {
        Self::from_seconds_number(hours.checked_mul(Number::from(SECS_IN_HOUR))?)
    }

    /// The cost of this many hours at `price_per_hour`, multiplying before dividing so whole
    /// seconds stay exact.
    pub(crate) fn cost_at(&self, price_per_hour: Number) -> Result<Number> {
        price_per_hour
            .checked_mul(self.as_num_seconds_number())?
            .checked_div(Number::from(SECS_IN_HOUR))
    }
}

impl Default for HoursDecimal {
    fn default() -> Self {
        Self::zero()
    }
}

/// A non-negative duration that converts from and to an integer amount of seconds, the unit
/// telemetry and restrictions use.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct SecondsRound(Duration);

impl SecondsRound {
    #[must_use]
    pub fn zero() -> Self {
        Self(Duration::zero())
    }

    pub fn from_secs(seconds: u64) -> Result<Self> {
        let seconds: i64 = seconds.try_into().map_err(|_| Error::NumericOverflow)?;
        Duration::try_seconds(seconds)
            .map(Self)
            .ok_or(Error::NumericOverflow)
    }

    #[must_use]
    pub fn as_secs(&self) -> i64 {
        self.0.num_seconds()
    }

    pub(crate) fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(&other.0)
            .map(Self)
            .ok_or(Error::NumericOverflow)
    }
}

impl Default for SecondsRound {
    fn default() -> Self {
        Self::zero()
    }
}

impl<'de> Deserialize<'de> for SecondsRound {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as DeError;

        let seconds = u64::deserialize(deserializer)?;
        Self::from_secs(seconds).map_err(DeError::custom)
    }
}

impl Serialize for SecondsRound {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0.num_seconds())
    }
}

impl From<SecondsRound> for Duration {
    fn from(value: SecondsRound) -> Self {
        value.0
    }
}

impl Display for SecondsRound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        HoursDecimal::from(*self).fmt(f)
    }
}
