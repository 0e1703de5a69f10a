use serde::{Deserialize, Serialize};

use crate::{
    types::{
        electricity::{Kw, Kwh, WattHours},
        time::{HoursDecimal, SecondsRound},
    },
    Error, Result,
};

/// Cumulative readings of a charging session at a certain point in time.
///
/// A snapshot is immutable; feeding a newer [`MeterValue`] to [`Telemetry::next`] produces the
/// next snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    energy_wh: WattHours,
    elapsed_secs: SecondsRound,
    inactivity_secs: SecondsRound,
}

impl Telemetry {
    /// A snapshot of a session that delivered `energy` over `elapsed`, of which it spent
    /// `inactivity` without charging.
    #[must_use]
    pub fn new(energy: WattHours, elapsed: SecondsRound, inactivity: SecondsRound) -> Self {
        Self {
            energy_wh: energy,
            elapsed_secs: elapsed,
            inactivity_secs: inactivity,
        }
    }

    /// Total energy delivered.
    #[must_use]
    pub fn energy(&self) -> WattHours {
        self.energy_wh
    }

    /// Total energy delivered, in the unit the energy dimension is priced in.
    #[must_use]
    pub fn energy_kwh(&self) -> Kwh {
        self.energy_wh.into()
    }

    /// The power figure used by power restrictions, see [`Kw::observed`].
    #[must_use]
    pub fn observed_power(&self) -> Kw {
        Kw::observed(self.energy_kwh())
    }

    /// Total duration of the session, charging or not.
    #[must_use]
    pub fn elapsed(&self) -> SecondsRound {
        self.elapsed_secs
    }

    /// Total duration the session was not charging.
    #[must_use]
    pub fn inactivity(&self) -> SecondsRound {
        self.inactivity_secs
    }

    /// Total duration of the session in hours.
    #[must_use]
    pub fn elapsed_hours(&self) -> HoursDecimal {
        self.elapsed_secs.into()
    }

    /// Total inactivity of the session in hours.
    #[must_use]
    pub fn inactivity_hours(&self) -> HoursDecimal {
        self.inactivity_secs.into()
    }

    /// The snapshot after applying `value`. The interval since the previous snapshot counts as
    /// inactivity if the meter did not advance during it.
    pub fn next(&self, value: &MeterValue) -> Result<Self> {
        if value.elapsed_secs < self.elapsed_secs || value.energy_wh < self.energy_wh {
            return Err(Error::OutOfOrderMeterValue {
                elapsed_secs: value.elapsed_secs.as_secs(),
            });
        }

        let interval = SecondsRound::from_secs(
            (value.elapsed_secs.as_secs() - self.elapsed_secs.as_secs()).unsigned_abs(),
        )?;

        let inactivity_secs = if value.energy_wh == self.energy_wh {
            self.inactivity_secs.checked_add(interval)?
        } else {
            self.inactivity_secs
        };

        Ok(Self {
            energy_wh: value.energy_wh,
            elapsed_secs: value.elapsed_secs,
            inactivity_secs,
        })
    }
}

/// A single cumulative meter reading, relative to the start of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValue {
    /// Energy register of the connector since the session started.
    pub energy_wh: WattHours,
    /// Seconds since the session started.
    pub elapsed_secs: SecondsRound,
}

impl MeterValue {
    #[must_use]
    pub fn new(energy: WattHours, elapsed: SecondsRound) -> Self {
        Self {
            energy_wh: energy,
            elapsed_secs: elapsed,
        }
    }
}
