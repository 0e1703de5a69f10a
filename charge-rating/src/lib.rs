//! # Charge rating library
//!
//! Functionality to determine which tariff definition applies to a charging session and what
//! is owed per billing dimension. Resolve the definitions for a session once with
//! [`context::PricingContextResolver`], then rate its telemetry as often as needed with
//! [`rater::Rater`].

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Resolving which tariff definitions apply to a session.
pub mod context;

/// Module for generating human readable tariff definitions.
pub mod explain;

/// Validation of tariff definitions before they are stored.
pub mod lint;

/// Pricing of a single billing dimension.
pub mod pricer;

/// Module containing the functionality to rate a session's consumption.
pub mod rater;

/// Eligibility of tariff definitions.
pub mod restriction;

/// Selection of the tariff definition that prices a dimension.
pub mod selector;

/// Tariff definitions and the resolved tariff model of a session.
pub mod tariff;

/// Metered readings of a charging session.
pub mod telemetry;

/// Decimal backed unit types used for calculations, serializing and deserializing.
pub mod types;

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible errors when resolving or rating a charging session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A numeric overflow occurred during calculation.
    #[error("A numeric overflow occurred during tariff calculation")]
    NumericOverflow,
    /// No tariff model could be found for the session. Whether this blocks billing is up to the
    /// caller.
    #[error("No pricing context could be resolved for transaction `{transaction_id}`")]
    NoPricingContext {
        /// The transaction that could not be resolved.
        transaction_id: i64,
    },
    /// The tenant does not own the transaction that was passed along with it.
    #[error("Transaction belongs to tenant `{actual}`, not to `{expected}`")]
    TenantMismatch {
        /// The tenant asked to resolve the transaction.
        expected: String,
        /// The tenant in the scope of the transaction.
        actual: String,
    },
    /// A tariff definition was rejected before storing it.
    #[error("Tariff definition `{name}` is invalid: {}", DisplayList(.errors))]
    InvalidTariffDefinition {
        /// Name of the rejected definition.
        name: String,
        /// Every problem found in the definition.
        errors: Vec<lint::Warning>,
    },
    /// A meter value was older than, or ran backwards from, the telemetry it was applied to.
    #[error("Meter value at {elapsed_secs}s is out of order")]
    OutOfOrderMeterValue {
        /// Elapsed seconds reported by the rejected meter value.
        elapsed_secs: i64,
    },
    /// The storage collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<rust_decimal::Error> for Error {
    fn from(_: rust_decimal::Error) -> Self {
        Self::NumericOverflow
    }
}

struct DisplayList<'a, T>(&'a [T]);

impl<T: fmt::Display> fmt::Display for DisplayList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, item) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }

            item.fmt(f)?;
        }

        Ok(())
    }
}

fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}
