//! Portfolio valuation and signal engine for a hand-entered stock portfolio.
//!
//! [`ValuationEngine`] turns holdings plus a daily price history into
//! per-holding valuation rows, a portfolio total and trend/risk/signal
//! labels. Holdings without usable data are reported as failures next to
//! the summary instead of aborting the pass. [`MoverScanner`] flags
//! watchlist tickers with unusual price or volume moves.

pub mod analysis;
pub mod config;
pub mod error;
pub mod holdings;
pub mod loader;
pub mod model;
pub mod movers;
pub mod notifier;
pub mod strategy;
pub mod utils;
pub mod valuation;

#[cfg(test)]
mod test_util;

pub use crate::config::{Capabilities, EngineConfig, MoverConfig, SignalMode, Variant};
pub use crate::error::ValuationError;
pub use crate::holdings::HoldingsStore;
pub use crate::loader::MarketDataSource;
pub use crate::movers::{MoverRecord, MoverScanner};
pub use crate::notifier::Notifier;
pub use crate::valuation::ValuationEngine;
