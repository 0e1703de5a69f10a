use tracing::trace;

use crate::{
    tariff::{ConnectorType, DynamicRestrictions, StaticRestrictions, TariffDefinition},
    telemetry::Telemetry,
    types::{electricity::Kw, time::DateTime, time::SecondsRound},
};

/// Whether `definition` is eligible for rating `telemetry`.
///
/// Every dynamic restriction has to hold; evaluation stops at the first one that does not. A
/// definition without restrictions always passes.
#[must_use]
pub fn passes_restrictions(definition: &TariffDefinition, telemetry: &Telemetry) -> bool {
    collect_restrictions(&definition.restrictions)
        .into_iter()
        .all(|restriction| {
            let valid = restriction.is_valid_for(telemetry);

            if !valid {
                trace!(definition = %definition.name, ?restriction, "restriction not met");
            }

            valid
        })
}

/// The metadata of a session static restrictions are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStart {
    pub started_at: DateTime,
    pub connector_type: Option<ConnectorType>,
    pub connector_power: Option<Kw>,
}

/// Whether `definition` applies to a session with the given start metadata.
///
/// A session whose connector type or power is unknown is not excluded by a restriction on it.
#[must_use]
pub fn passes_static_restrictions(definition: &TariffDefinition, session: &SessionStart) -> bool {
    collect_static_restrictions(&definition.static_restrictions)
        .into_iter()
        .all(|restriction| restriction.is_valid_for(session))
}

pub(crate) fn collect_restrictions(restrictions: &DynamicRestrictions) -> Vec<Restriction> {
    let mut collected = Vec::new();

    if let Some(min_power) = restrictions.min_power {
        collected.push(Restriction::MinPower(min_power));
    }

    if let Some(max_power) = restrictions.max_power {
        collected.push(Restriction::MaxPower(max_power));
    }

    if let Some(min_duration) = restrictions.min_duration_secs {
        collected.push(Restriction::MinDuration(min_duration));
    }

    if let Some(max_duration) = restrictions.max_duration_secs {
        collected.push(Restriction::MaxDuration(max_duration));
    }

    collected
}

fn collect_static_restrictions(restrictions: &StaticRestrictions) -> Vec<StaticRestriction> {
    let mut collected = Vec::new();

    if let Some(valid_from) = restrictions.valid_from {
        collected.push(StaticRestriction::ValidFrom(valid_from));
    }

    if let Some(valid_to) = restrictions.valid_to {
        collected.push(StaticRestriction::ValidTo(valid_to));
    }

    if let Some(connector_type) = restrictions.connector_type {
        collected.push(StaticRestriction::ConnectorType(connector_type));
    }

    if let Some(connector_power) = restrictions.connector_power {
        collected.push(StaticRestriction::ConnectorPower(connector_power));
    }

    collected
}

/// A restriction evaluated against the session's telemetry on every rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Restriction {
    MinPower(Kw),
    MaxPower(Kw),
    MinDuration(SecondsRound),
    MaxDuration(SecondsRound),
}

impl Restriction {
    /// Lower bounds are inclusive, upper bounds exclusive.
    pub(crate) fn is_valid_for(self, telemetry: &Telemetry) -> bool {
        match self {
            Self::MinPower(min_power) => telemetry.observed_power() >= min_power,
            Self::MaxPower(max_power) => telemetry.observed_power() < max_power,
            Self::MinDuration(min_duration) => telemetry.elapsed() >= min_duration,
            Self::MaxDuration(max_duration) => telemetry.elapsed() < max_duration,
        }
    }
}

/// A restriction evaluated once against the session's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StaticRestriction {
    ValidFrom(DateTime),
    ValidTo(DateTime),
    ConnectorType(ConnectorType),
    ConnectorPower(Kw),
}

impl StaticRestriction {
    fn is_valid_for(self, session: &SessionStart) -> bool {
        match self {
            Self::ValidFrom(valid_from) => session.started_at >= valid_from,
            Self::ValidTo(valid_to) => session.started_at < valid_to,
            Self::ConnectorType(connector_type) => session
                .connector_type
                .is_none_or(|connector| connector == connector_type),
            Self::ConnectorPower(connector_power) => session
                .connector_power
                .is_none_or(|power| power == connector_power),
        }
    }
}
