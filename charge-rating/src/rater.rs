use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    pricer::{Occurrences, PricedDimension, StepMode},
    restriction::passes_restrictions,
    selector::select_and_price,
    tariff::{DimensionKind, ResolvedTariffModel, TariffDefinition},
    telemetry::Telemetry,
    types::{electricity::Kwh, money::Money, time::HoursDecimal},
    Result,
};

/// Settings that change how usage is turned into amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingConfig {
    #[serde(default)]
    pub step_mode: StepMode,
}

/// Rater that prices the consumption of a session against its resolved tariff model.
///
/// Rating is free of side effects, so a session can be rated as often as new telemetry comes
/// in and once more when it closes.
/// ```ignore
/// let rater = Rater::new(RatingConfig::default());
/// let consumption = rater.rate(&model, &telemetry)?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Rater {
    config: RatingConfig,
}

impl Rater {
    #[must_use]
    pub fn new(config: RatingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> RatingConfig {
        self.config
    }

    /// Price every dimension of `telemetry` with the definitions of `model` that pass their
    /// restrictions. Dimensions that no eligible definition prices are left out.
    #[instrument(skip_all, fields(step_mode = %self.config.step_mode))]
    pub fn rate(
        &self,
        model: &ResolvedTariffModel,
        telemetry: &Telemetry,
    ) -> Result<PricedConsumption> {
        let eligible: Vec<&TariffDefinition> = model
            .definitions()
            .iter()
            .filter(|definition| {
                let passes = passes_restrictions(definition, telemetry);

                if !passes {
                    debug!(definition = %definition.name, "definition excluded by restrictions");
                }

                passes
            })
            .collect();

        let quantities = Quantities::from(telemetry);
        let step_mode = self.config.step_mode;

        Ok(PricedConsumption {
            flat_fee: select_and_price(
                &eligible,
                DimensionKind::FlatFee,
                quantities.flat_fee,
                step_mode,
            )?,
            energy: select_and_price(
                &eligible,
                DimensionKind::Energy,
                quantities.energy,
                step_mode,
            )?,
            charging_time: select_and_price(
                &eligible,
                DimensionKind::ChargingTime,
                quantities.charging_time,
                step_mode,
            )?,
            parking_time: select_and_price(
                &eligible,
                DimensionKind::ParkingTime,
                quantities.parking_time,
                step_mode,
            )?,
        })
    }
}

/// The volume of every dimension in the unit it is priced in.
struct Quantities {
    flat_fee: Occurrences,
    energy: Kwh,
    charging_time: HoursDecimal,
    parking_time: HoursDecimal,
}

impl From<&Telemetry> for Quantities {
    fn from(telemetry: &Telemetry) -> Self {
        Self {
            flat_fee: Occurrences::ONCE,
            energy: telemetry.energy_kwh(),
            charging_time: telemetry.elapsed_hours(),
            parking_time: telemetry.inactivity_hours(),
        }
    }
}

/// The priced consumption of a session, one entry per dimension that was priced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedConsumption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flat_fee: Option<PricedDimension<Occurrences>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<PricedDimension<Kwh>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_time: Option<PricedDimension<HoursDecimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking_time: Option<PricedDimension<HoursDecimal>>,
}

impl PricedConsumption {
    /// Whether no dimension was priced at all. Valid, but hints at a gap in the tariff model.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts().next().is_none()
    }

    /// The amount owed per priced dimension, in [`DimensionKind::ALL`] order.
    pub fn amounts(&self) -> impl Iterator<Item = (DimensionKind, Money)> {
        [
            (DimensionKind::FlatFee, self.flat_fee.as_ref().map(|d| d.amount)),
            (DimensionKind::Energy, self.energy.as_ref().map(|d| d.amount)),
            (
                DimensionKind::ChargingTime,
                self.charging_time.as_ref().map(|d| d.amount),
            ),
            (
                DimensionKind::ParkingTime,
                self.parking_time.as_ref().map(|d| d.amount),
            ),
        ]
        .into_iter()
        .filter_map(|(kind, amount)| amount.map(|amount| (kind, amount)))
    }

    /// Sum of all priced dimensions, `None` if nothing was priced.
    pub fn total_amount(&self) -> Result<Option<Money>> {
        self.amounts().try_fold(None, |total: Option<Money>, (_, amount)| {
            total
                .unwrap_or_else(Money::zero)
                .checked_add(amount)
                .map(Some)
        })
    }
}
