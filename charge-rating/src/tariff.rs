use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    null_default,
    types::{
        electricity::Kw,
        money::Money,
        number::Number,
        time::{DateTime, SecondsRound},
    },
};

/// A priceable aspect of a charging session.
#[derive(Debug, Copy, PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DimensionKind {
    /// Charged once per session, no unit.
    FlatFee,
    /// Defined in kWh, step size in Wh.
    Energy,
    /// Duration of the session: defined in hours, step size in seconds.
    ChargingTime,
    /// Duration the session was not charging: defined in hours, step size in seconds.
    ParkingTime,
}

impl DimensionKind {
    /// Every dimension, in the order they are rated and reported.
    pub const ALL: [Self; 4] = [
        Self::FlatFee,
        Self::Energy,
        Self::ChargingTime,
        Self::ParkingTime,
    ];

    /// The unit a price of this dimension is expressed per.
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::FlatFee => "session",
            Self::Energy => "kWh",
            Self::ChargingTime | Self::ParkingTime => "hour",
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display = match self {
            Self::FlatFee => "flat fee",
            Self::Energy => "energy",
            Self::ChargingTime => "charging time",
            Self::ParkingTime => "parking time",
        };

        f.write_str(display)
    }
}

/// Pricing of one dimension within a tariff definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSpec {
    /// Price per unit of the dimension.
    pub price: Money,

    /// Usage is billed in blocks of this many base units: Wh for energy, seconds for charging
    /// and parking time. Ignored for the flat fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<u64>,

    /// Only active specs take part in rating. Absent means inactive.
    #[serde(default)]
    pub active: bool,
}

impl DimensionSpec {
    /// The step size, if it actually splits usage into blocks.
    #[must_use]
    pub fn effective_step_size(&self) -> Option<u64> {
        self.step_size.filter(|&step_size| step_size > 0)
    }
}

/// The dimension specs of a tariff definition, at most one per [`DimensionKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_fee: Option<DimensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<DimensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_time: Option<DimensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking_time: Option<DimensionSpec>,
}

impl Dimensions {
    #[must_use]
    pub fn get(&self, kind: DimensionKind) -> Option<&DimensionSpec> {
        match kind {
            DimensionKind::FlatFee => self.flat_fee.as_ref(),
            DimensionKind::Energy => self.energy.as_ref(),
            DimensionKind::ChargingTime => self.charging_time.as_ref(),
            DimensionKind::ParkingTime => self.parking_time.as_ref(),
        }
    }

    /// The spec of `kind`, if there is one and it is active.
    #[must_use]
    pub fn active(&self, kind: DimensionKind) -> Option<&DimensionSpec> {
        self.get(kind).filter(|spec| spec.active)
    }

    /// All present specs with their kind, in [`DimensionKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (DimensionKind, &DimensionSpec)> {
        DimensionKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|spec| (kind, spec)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// The level of the pricing hierarchy an entity lives on, broadest first.
#[derive(Debug, Copy, PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum ScopeLevel {
    Tenant,
    Company,
    Site,
    SiteArea,
    ChargingStation,
    UserGroup,
    User,
}

/// Connector standards a tariff definition can be restricted to.
#[derive(Debug, Copy, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
pub enum ConnectorType {
    #[serde(rename = "T1")]
    Type1,
    #[serde(rename = "T1CCS")]
    Type1Ccs,
    #[serde(rename = "T2")]
    Type2,
    #[serde(rename = "T3C")]
    Type3C,
    #[serde(rename = "CCS")]
    ComboCcs,
    #[serde(rename = "C")]
    Chademo,
    #[serde(rename = "D")]
    Domestic,
    #[serde(rename = "U")]
    Unknown,
}

/// Conditions on the live session a definition needs to meet to be eligible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicRestrictions {
    /// Minimum observed power in kW, valid from this power.
    #[serde(
        default,
        rename = "minPowerkW",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_power: Option<Kw>,

    /// Maximum observed power in kW, valid up to (excluding) this power.
    #[serde(
        default,
        rename = "maxPowerkW",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_power: Option<Kw>,

    /// Minimum session duration in seconds, valid from this duration.
    #[serde(
        default,
        deserialize_with = "duration_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_duration_secs: Option<SecondsRound>,

    /// Maximum session duration in seconds, valid up to (excluding) this duration.
    #[serde(
        default,
        deserialize_with = "duration_bound",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_duration_secs: Option<SecondsRound>,
}

/// Reads a duration bound in decimal seconds.
///
/// Elapsed time is counted in whole seconds, so a fractional bound is rounded up: both
/// `elapsed >= 1800.5` and `elapsed < 1800.5` give the same answer with `1801`.
fn duration_bound<'de, D>(deserializer: D) -> Result<Option<SecondsRound>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let Some(seconds) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if seconds.is_sign_negative() {
        return Err(D::Error::custom("duration must not be negative"));
    }

    let seconds = i64::try_from(seconds.ceil()).map_err(D::Error::custom)?;
    let seconds = u64::try_from(seconds).map_err(D::Error::custom)?;

    SecondsRound::from_secs(seconds)
        .map(Some)
        .map_err(D::Error::custom)
}

impl DynamicRestrictions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Conditions on the session's metadata, checked once when the session's context is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticRestrictions {
    /// The definition applies to sessions starting at or after this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime>,

    /// The definition applies to sessions starting before this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime>,

    /// The definition only applies to sessions on this kind of connector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_type: Option<ConnectorType>,

    /// The definition only applies to sessions on connectors rated at this power.
    #[serde(
        default,
        rename = "connectorPowerkW",
        skip_serializing_if = "Option::is_none"
    )]
    pub connector_power: Option<Kw>,
}

/// A priceable offer for an entity of the pricing hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffDefinition {
    /// Storage identifier, absent for definitions that were not stored yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The entity this definition is scoped to.
    pub entity_id: String,

    /// The level of the hierarchy `entity_id` lives on.
    pub entity_type: ScopeLevel,

    /// Name shown on invoices next to the amounts this definition priced.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub static_restrictions: StaticRestrictions,

    #[serde(default, deserialize_with = "null_default")]
    pub restrictions: DynamicRestrictions,

    pub dimensions: Dimensions,
}

/// The ordered tariff definitions attached to a session for its whole lifetime.
///
/// Order is significant: when several definitions can price a dimension the earliest wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTariffModel {
    definitions: Vec<TariffDefinition>,
}

impl ResolvedTariffModel {
    #[must_use]
    pub fn new(definitions: Vec<TariffDefinition>) -> Self {
        Self { definitions }
    }

    #[must_use]
    pub fn definitions(&self) -> &[TariffDefinition] {
        &self.definitions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
