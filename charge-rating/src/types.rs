/// Energy and power quantities.
pub mod electricity;

/// Monetary amounts.
pub mod money;

pub(crate) mod number;

/// Durations and instants.
pub mod time;
