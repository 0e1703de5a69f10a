use crate::{
    tariff::{ConnectorType, DimensionKind, DynamicRestrictions, TariffDefinition},
    types::{
        electricity::Kw,
        money::Money,
        time::{DateTime, HoursDecimal, SecondsRound},
    },
};

#[derive(Debug)]
pub struct Explain {
    pub name: String,
    pub description: Option<String>,
    pub valid_from: Option<DateTime>,
    pub valid_to: Option<DateTime>,
    pub connector_type: Option<ConnectorType>,
    pub connector_power: Option<Kw>,
    pub restrictions: Vec<String>,
    pub dimensions: Vec<ExplainDimension>,
}

#[derive(Debug)]
pub struct ExplainDimension {
    pub kind: DimensionKind,
    pub price: Money,
    pub step_size: Option<u64>,
    pub active: bool,
}

#[must_use]
pub fn explain(definition: &TariffDefinition) -> Explain {
    let dimensions = definition
        .dimensions
        .iter()
        .map(|(kind, spec)| ExplainDimension {
            kind,
            price: spec.price.normalize(),
            step_size: spec.effective_step_size(),
            active: spec.active,
        })
        .collect();

    Explain {
        name: definition.name.clone(),
        description: definition.description.clone(),
        valid_from: definition.static_restrictions.valid_from,
        valid_to: definition.static_restrictions.valid_to,
        connector_type: definition.static_restrictions.connector_type,
        connector_power: definition.static_restrictions.connector_power,
        restrictions: explain_restrictions(&definition.restrictions),
        dimensions,
    }
}

/// Explain the given restrictions.
#[must_use]
pub fn explain_restrictions(restr: &DynamicRestrictions) -> Vec<String> {
    let mut explains = Vec::new();

    if let Some((min_power, max_power)) = restr.min_power.zip(restr.max_power) {
        explains.push(format!(
            "observed power is between {min_power} and {max_power} kW"
        ));
    } else if let Some(min_power) = restr.min_power {
        explains.push(format!("observed power is at least {min_power} kW"));
    } else if let Some(max_power) = restr.max_power {
        explains.push(format!("observed power is less than {max_power} kW"));
    }

    let hours = |secs: SecondsRound| HoursDecimal::from(secs).as_num_hours_decimal().normalize();

    if let Some((min_duration, max_duration)) =
        restr.min_duration_secs.zip(restr.max_duration_secs)
    {
        explains.push(format!(
            "session duration is between {} and {} hours",
            hours(min_duration),
            hours(max_duration)
        ));
    } else if let Some(min_duration) = restr.min_duration_secs {
        explains.push(format!(
            "session duration is at least {} hours",
            hours(min_duration)
        ));
    } else if let Some(max_duration) = restr.max_duration_secs {
        explains.push(format!(
            "session duration is less than {} hours",
            hours(max_duration)
        ));
    }

    explains
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{explain, explain_restrictions};
    use crate::{
        tariff::{DimensionKind, DynamicRestrictions, TariffDefinition},
        types::{money::Money, time::SecondsRound},
    };

    #[test]
    fn explains_restrictions_and_prices() {
        let definition: TariffDefinition = serde_json::from_str(
            r#"{
                "entityId": "CS-001",
                "entityType": "ChargingStation",
                "name": "AC-long",
                "restrictions": {
                    "minPowerkW": 7.0,
                    "maxPowerkW": 22,
                    "minDurationSecs": 1800
                },
                "dimensions": {
                    "energy": { "price": 0.3500, "stepSize": 1000, "active": true },
                    "parkingTime": { "price": 2, "active": false }
                }
            }"#,
        )
        .unwrap();

        let explain = explain(&definition);

        assert_eq!(
            explain.restrictions,
            [
                "observed power is between 7 and 22 kW",
                "session duration is at least 0.5 hours"
            ]
        );
        assert_eq!(explain.dimensions.len(), 2);
        assert_eq!(explain.dimensions[0].kind, DimensionKind::Energy);
        assert_eq!(explain.dimensions[0].price, Money::from(dec!(0.35)));
        assert_eq!(explain.dimensions[0].step_size, Some(1000));
        assert!(!explain.dimensions[1].active);
        assert!(explain.connector_power.is_none());
    }

    #[test]
    fn minimum_duration_bound_reads_inclusive() {
        let restrictions = DynamicRestrictions {
            min_duration_secs: Some(SecondsRound::from_secs(5400).unwrap()),
            ..DynamicRestrictions::default()
        };

        assert_eq!(
            explain_restrictions(&restrictions),
            ["session duration is at least 1.5 hours"]
        );
    }
}
