use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    tariff::DimensionSpec,
    types::{electricity::Kwh, money::Money, number::Number, time::HoursDecimal},
    Result,
};

/// How a step size turns consumed usage into billed usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepMode {
    /// Bill only what remains after the last full step: `usage mod step_size`.
    ///
    /// 6 minutes of usage on a 5 minute step bills 1 minute. This is how stepped dimensions
    /// have always been rated, so it stays the default.
    #[default]
    Remainder,
    /// Bill usage rounded up to the next full step: `ceil(usage / step_size) * step_size`.
    ///
    /// 6 minutes of usage on a 5 minute step bills 10 minutes.
    RoundUp,
}

impl fmt::Display for StepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remainder => f.write_str("remainder"),
            Self::RoundUp => f.write_str("round-up"),
        }
    }
}

/// The priced usage of one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedDimension<V> {
    /// The amount owed, unrounded.
    pub amount: Money,
    /// The usage as measured.
    pub quantity: V,
    /// The usage `amount` was computed from, after applying the step size. Equal to
    /// `quantity` when the dimension is not stepped.
    pub billed_quantity: V,
    /// Name of the tariff definition that priced this dimension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
}

/// Price `volume` of a dimension according to `spec`.
///
/// `spec` is expected to be active, selecting specs is up to the caller.
pub fn price_dimension<V: Dimension>(
    spec: &DimensionSpec,
    volume: V,
    step_mode: StepMode,
) -> Result<PricedDimension<V>> {
    let billed_volume = match spec.effective_step_size() {
        Some(step_size) => volume.apply_step(step_size, step_mode)?,
        None => volume,
    };

    Ok(PricedDimension {
        amount: billed_volume.cost(spec.price)?,
        quantity: volume,
        billed_quantity: billed_volume,
        item_description: None,
    })
}

/// A unit a dimension is priced in.
pub trait Dimension: Copy {
    /// The cost of this volume at `price` per unit.
    fn cost(&self, price: Money) -> Result<Money>;

    /// The volume that is billed when usage is stepped in blocks of `step_size` base units.
    fn apply_step(self, step_size: u64, step_mode: StepMode) -> Result<Self>;
}

/// Number of times a flat fee is charged. Always one per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Occurrences(u64);

impl Occurrences {
    pub const ONCE: Self = Self(1);
}

impl fmt::Display for Occurrences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

impl Dimension for Occurrences {
    fn cost(&self, price: Money) -> Result<Money> {
        price.checked_times(Number::from(self.0))
    }

    /// A flat fee has no unit to step.
    fn apply_step(self, _: u64, _: StepMode) -> Result<Self> {
        Ok(self)
    }
}

impl Dimension for Kwh {
    fn cost(&self, price: Money) -> Result<Money> {
        price.checked_times(self.number())
    }

    /// Steps are expressed in Wh.
    fn apply_step(self, step_size: u64, step_mode: StepMode) -> Result<Self> {
        let billed = step_base_units(self.watt_hours()?, step_size, step_mode)?;
        Ok(Kwh::from_watt_hours(billed))
    }
}

impl Dimension for HoursDecimal {
    fn cost(&self, price: Money) -> Result<Money> {
        self.cost_at(Number::from(price)).map(Money::from)
    }

    /// Steps are expressed in seconds.
    fn apply_step(self, step_size: u64, step_mode: StepMode) -> Result<Self> {
        let billed = step_base_units(self.as_num_seconds_number(), step_size, step_mode)?;
        HoursDecimal::from_seconds_number(billed)
    }
}

fn step_base_units(total: Number, step_size: u64, step_mode: StepMode) -> Result<Number> {
    let step_size = Number::from(step_size);

    match step_mode {
        StepMode::Remainder => total.checked_rem(step_size),
        StepMode::RoundUp => total
            .checked_div(step_size)?
            .ceil()
            .checked_mul(step_size),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{price_dimension, Occurrences, StepMode};
    use crate::{
        tariff::DimensionSpec,
        types::{
            electricity::{Kwh, WattHours},
            money::Money,
            time::{HoursDecimal, SecondsRound},
        },
    };

    fn spec(price: rust_decimal::Decimal, step_size: Option<u64>) -> DimensionSpec {
        DimensionSpec {
            price: Money::from(price),
            step_size,
            active: true,
        }
    }

    fn minutes(minutes: u64) -> HoursDecimal {
        SecondsRound::from_secs(minutes * 60).unwrap().into()
    }

    #[test]
    fn unstepped_amount_is_price_times_quantity() {
        let cases = [
            (dec!(0.50), dec!(32.325)),
            (dec!(0.1), dec!(3)),
            (dec!(0.35), dec!(12.345)),
            (dec!(0.07), dec!(1000000.001)),
            (dec!(1.23456789), dec!(0.1)),
            (dec!(0.30), dec!(0)),
        ];

        for (price, kwh) in cases {
            let priced =
                price_dimension(&spec(price, None), Kwh::from(kwh), StepMode::Remainder).unwrap();

            assert_eq!(priced.amount, Money::from(price * kwh), "{price} x {kwh}");
            assert_eq!(priced.quantity, Kwh::from(kwh));
            assert_eq!(priced.billed_quantity, priced.quantity);
            assert_eq!(priced.item_description, None);
        }

        let priced = price_dimension(
            &spec(dec!(0.35), None),
            Kwh::from(dec!(12.345)),
            StepMode::Remainder,
        )
        .unwrap();
        assert_eq!(priced.amount, Money::from(dec!(4.32075)));
    }

    #[test]
    fn zero_step_size_is_not_stepped() {
        let priced = price_dimension(
            &spec(dec!(0.25), Some(0)),
            Kwh::from(dec!(32.325)),
            StepMode::RoundUp,
        )
        .unwrap();

        assert_eq!(priced.amount, Money::from(dec!(8.08125)));
    }

    #[test]
    fn flat_fee_is_charged_once_and_never_stepped() {
        let priced = price_dimension(
            &spec(dec!(1.5), Some(300)),
            Occurrences::ONCE,
            StepMode::RoundUp,
        )
        .unwrap();

        assert_eq!(priced.amount, Money::from(dec!(1.5)));
        assert_eq!(priced.billed_quantity, Occurrences::ONCE);
    }

    #[test]
    fn remainder_step_bills_usage_after_last_full_block() {
        let priced = price_dimension(&spec(dec!(12), Some(300)), minutes(6), StepMode::Remainder)
            .unwrap();

        assert_eq!(priced.billed_quantity, minutes(1));
        assert_eq!(priced.amount, Money::from(dec!(0.2)));
    }

    #[test]
    fn round_up_step_bills_whole_blocks() {
        let priced = price_dimension(&spec(dec!(12), Some(300)), minutes(6), StepMode::RoundUp)
            .unwrap();

        assert_eq!(priced.billed_quantity, minutes(10));
        assert_eq!(priced.amount, Money::from(dec!(2)));
    }

    #[test]
    fn exact_multiple_of_step() {
        let spec = spec(dec!(12), Some(300));
        let remainder = price_dimension(&spec, minutes(10), StepMode::Remainder).unwrap();
        let round_up = price_dimension(&spec, minutes(10), StepMode::RoundUp).unwrap();

        assert_eq!(remainder.amount, Money::from(dec!(0)));
        assert_eq!(round_up.amount, Money::from(dec!(2)));
    }

    #[test]
    fn energy_steps_are_watt_hours() {
        let energy = Kwh::from(WattHours::from(32_325));

        let remainder =
            price_dimension(&spec(dec!(0.25), Some(5000)), energy, StepMode::Remainder).unwrap();
        assert_eq!(remainder.billed_quantity, Kwh::from(dec!(2.325)));
        assert_eq!(remainder.amount, Money::from(dec!(0.58125)));

        let round_up =
            price_dimension(&spec(dec!(0.25), Some(5000)), energy, StepMode::RoundUp).unwrap();
        assert_eq!(round_up.billed_quantity, Kwh::from(dec!(35)));
        assert_eq!(round_up.amount, Money::from(dec!(8.75)));
    }
}
