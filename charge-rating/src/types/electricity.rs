use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};

use super::number::Number;
use crate::Result;

const WH_IN_KWH: u64 = 1000;

/// A cumulated amount of energy in watt hours, as reported by a meter.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct WattHours(Number);

impl WattHours {
    #[must_use]
    pub fn zero() -> Self {
        Self(Number::ZERO)
    }

    /// Returns `None` for negative amounts, meters never run backwards.
    #[must_use]
    pub fn new(wh: rust_decimal::Decimal) -> Option<Self> {
        let number = Number::from(wh);
        (!number.is_sign_negative()).then_some(Self(number))
    }
}

impl<'de> Deserialize<'de> for WattHours {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let wh = <rust_decimal::Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(wh).ok_or_else(|| D::Error::custom("energy must not be negative"))
    }
}

impl From<u64> for WattHours {
    fn from(wh: u64) -> Self {
        Self(Number::from(wh))
    }
}

impl Display for WattHours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Wh", self.0)
    }
}

/// A value of kilo watt hours, the unit the energy dimension is priced in.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct Kwh(Number);

impl Kwh {
    #[must_use]
    pub fn zero() -> Self {
        Self(Number::ZERO)
    }

    pub(crate) fn watt_hours(self) -> Result<Number> {
        self.0.checked_mul(Number::from(WH_IN_KWH))
    }

    pub(crate) fn from_watt_hours(wh: Number) -> Self {
        Self(
            wh.checked_div(Number::from(WH_IN_KWH))
                .unwrap_or_else(|_| unreachable!("divisor is non-zero")),
        )
    }

    pub(crate) fn number(self) -> Number {
        self.0
    }
}

impl From<WattHours> for Kwh {
    fn from(wh: WattHours) -> Self {
        Self::from_watt_hours(wh.0)
    }
}

impl From<rust_decimal::Decimal> for Kwh {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self(value.into())
    }
}

impl From<Kwh> for rust_decimal::Decimal {
    fn from(value: Kwh) -> Self {
        value.0.into()
    }
}

impl Display for Kwh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// A value of kilo watts.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Kw(Number);

impl Kw {
    /// The power figure restrictions are checked against.
    ///
    /// This is the cumulated energy read as kilo watts, not an instantaneous or time averaged
    /// power. Restrictions on power therefore behave like restrictions on delivered energy.
    pub(crate) fn observed(energy: Kwh) -> Self {
        Self(energy.0)
    }
}

impl From<rust_decimal::Decimal> for Kw {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self(value.into())
    }
}

impl From<Kw> for rust_decimal::Decimal {
    fn from(value: Kw) -> Self {
        value.0.into()
    }
}

impl Display for Kw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.normalize().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{Kwh, WattHours};

    #[test]
    fn watt_hours_convert_exactly_to_kwh() {
        let kwh = Kwh::from(WattHours::from(32_325));
        assert_eq!(kwh, Kwh::from(dec!(32.325)));
    }

    #[test]
    fn negative_energy_is_rejected() {
        assert!(WattHours::new(dec!(-1)).is_none());
        assert!(serde_json::from_str::<WattHours>("-12.5").is_err());
    }

    #[test]
    fn deserializes_fractional_watt_hours() {
        let wh: WattHours = serde_json::from_str("32325.5").unwrap();
        assert_eq!(wh, WattHours::new(dec!(32325.5)).unwrap());

        let zero: WattHours = serde_json::from_str("0").unwrap();
        assert_eq!(zero, WattHours::zero());
    }

    #[test]
    fn kwh_converts_back_to_watt_hours() {
        let wh = Kwh::from(dec!(2.325)).watt_hours().unwrap();
        assert_eq!(wh, WattHours::from(2325).0);
    }
}
