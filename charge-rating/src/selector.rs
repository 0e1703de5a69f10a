use tracing::{debug, trace};

use crate::{
    pricer::{price_dimension, Dimension, PricedDimension, StepMode},
    tariff::{DimensionKind, TariffDefinition},
    Result,
};

/// Price `volume` of `kind` with the first of `candidates` that has an active spec for it.
///
/// Candidates are expected to have passed their restrictions already and to be in resolution
/// order. Returns `None` when no candidate prices `kind`, which is different from pricing it at
/// zero. The winning definition's name is stamped on the result as its item description.
pub fn select_and_price<V: Dimension>(
    candidates: &[&TariffDefinition],
    kind: DimensionKind,
    volume: V,
    step_mode: StepMode,
) -> Result<Option<PricedDimension<V>>> {
    let selected = candidates.iter().find_map(|definition| {
        let spec = definition.dimensions.active(kind);

        if spec.is_none() {
            trace!(definition = %definition.name, %kind, "no active spec");
        }

        spec.map(|spec| (definition, spec))
    });

    let Some((definition, spec)) = selected else {
        debug!(%kind, "dimension not priced");
        return Ok(None);
    };

    let mut priced = price_dimension(spec, volume, step_mode)?;
    priced.item_description = Some(definition.name.clone());

    debug!(definition = %definition.name, %kind, amount = %priced.amount, "dimension priced");

    Ok(Some(priced))
}
