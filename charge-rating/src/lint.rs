use std::fmt::Display;

use crate::{
    tariff::{DimensionKind, TariffDefinition},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    NoDimensions,
    NoActiveDimension,
    NonPositivePrice { kind: DimensionKind },
    StepSizeOnFlatFee,
    EmptyPowerRange,
    EmptyDurationRange,
    EmptyValidityWindow,
    InactiveDimension { kind: DimensionKind },
}

impl Warning {
    /// Whether the definition cannot be stored with this warning.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Self::InactiveDimension { .. } | Self::StepSizeOnFlatFee
        )
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDimensions => f.write_str("`$.dimensions` is empty, nothing can be priced."),
            Self::NoActiveDimension => {
                f.write_str("No dimension in `$.dimensions` is active, nothing can be priced.")
            }
            Self::NonPositivePrice { kind } => {
                write!(f, "Active {kind} dimension has a price that is not positive.")
            }
            Self::StepSizeOnFlatFee => write!(
                f,
                "`$.dimensions.flatFee.stepSize` is ignored, consider removing it."
            ),
            Self::EmptyPowerRange => write!(
                f,
                "`$.restrictions.minPowerkW` is not below `maxPowerkW`, the definition never applies."
            ),
            Self::EmptyDurationRange => write!(
                f,
                "`$.restrictions.minDurationSecs` is not below `maxDurationSecs`, the definition never applies."
            ),
            Self::EmptyValidityWindow => write!(
                f,
                "`$.staticRestrictions.validFrom` is not before `validTo`, the definition never applies."
            ),
            Self::InactiveDimension { kind } => {
                write!(f, "The {kind} dimension is inactive, consider removing it.")
            }
        }
    }
}

/// Lint the provided tariff definition and produce a set of relevant warnings.
#[must_use]
pub fn lint(definition: &TariffDefinition) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let dimensions = &definition.dimensions;

    if dimensions.is_empty() {
        warnings.push(Warning::NoDimensions);
    } else if dimensions.iter().all(|(_, spec)| !spec.active) {
        warnings.push(Warning::NoActiveDimension);
    }

    for (kind, spec) in dimensions.iter() {
        if !spec.active {
            warnings.push(Warning::InactiveDimension { kind });
        } else if !spec.price.is_positive() {
            warnings.push(Warning::NonPositivePrice { kind });
        }

        if kind == DimensionKind::FlatFee && spec.effective_step_size().is_some() {
            warnings.push(Warning::StepSizeOnFlatFee);
        }
    }

    let restrictions = &definition.restrictions;

    if let Some((min, max)) = restrictions.min_power.zip(restrictions.max_power) {
        if min >= max {
            warnings.push(Warning::EmptyPowerRange);
        }
    }

    if let Some((min, max)) = restrictions
        .min_duration_secs
        .zip(restrictions.max_duration_secs)
    {
        if min >= max {
            warnings.push(Warning::EmptyDurationRange);
        }
    }

    let static_restrictions = &definition.static_restrictions;

    if let Some((from, to)) = static_restrictions
        .valid_from
        .zip(static_restrictions.valid_to)
    {
        if from >= to {
            warnings.push(Warning::EmptyValidityWindow);
        }
    }

    warnings
}

/// Reject `definition` if linting it produces any error.
pub fn validate(definition: &TariffDefinition) -> Result<()> {
    let errors: Vec<_> = lint(definition)
        .into_iter()
        .filter(Warning::is_error)
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidTariffDefinition {
            name: definition.name.clone(),
            errors,
        })
    }
}
