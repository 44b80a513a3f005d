use thiserror::Error;

use crate::config::Variant;

pub type Result<T> = std::result::Result<T, ValuationError>;

/// Errors that abort a whole valuation pass.
///
/// Bad price data for a single holding is never an error here; it is
/// reported as a [`ValuationFailure`](crate::model::ValuationFailure).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValuationError {
    #[error("Invalid holding at position {index}: ticker is empty")]
    EmptyTicker { index: usize },

    #[error("Invalid holding {ticker}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity { ticker: String, quantity: i64 },

    #[error("Merged quantity for {ticker} does not fit in an i64")]
    QuantityOverflow { ticker: String },

    #[error("The {variant:?} variant does not provide {capability}")]
    CapabilityDisabled {
        capability: &'static str,
        variant: Variant,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
