use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockMarket {
    #[default]
    Global,
    Nse,
    Bse,
}

impl StockMarket {
    /// Exchange suffix appended to bare symbols, e.g. `RELIANCE` -> `RELIANCE.NS`.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            StockMarket::Global => None,
            StockMarket::Nse => Some(".NS"),
            StockMarket::Bse => Some(".BO"),
        }
    }
}

pub type Price = f64;

#[derive(Default, Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySeriesData {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: usize,
}

/// Daily bars of one ticker, keyed (and therefore ordered) by trading day.
pub type Trades = BTreeMap<NaiveDate, DaySeriesData>;

/// Ticker -> daily bars. A ticker missing from the map failed to fetch.
pub type PriceHistory = HashMap<String, Trades>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingEntry {
    pub ticker: String,
    pub quantity: i64,
}

impl HoldingEntry {
    pub fn new(ticker: impl Into<String>, quantity: i64) -> Self {
        Self {
            ticker: ticker.into(),
            quantity,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum TrendLabel {
    Uptrend,
    Downtrend,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Medium,
    High,
    #[display(fmt = "Insufficient data")]
    InsufficientData,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum SignalLabel {
    Buy,
    Sell,
    Hold,
    #[display(fmt = "Insufficient data for signal")]
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRow {
    pub ticker: String,
    pub quantity: i64,
    pub latest_price: Price,
    pub previous_close: Price,
    pub change_pct: f64,
    /// `(latest_price - previous_close) * quantity`
    pub day_change: f64,
    pub position_value: f64,
    pub trend: TrendLabel,
    pub risk: RiskLabel,
    /// `None` when the EMA signal capability is off.
    pub signal: Option<SignalLabel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub rows: Vec<ValuationRow>,
    /// Sum of `position_value` over `rows` only.
    pub total_value: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum FailureReason {
    /// Ticker absent from the fetched history.
    NoData,
    /// Fewer bars than the valuation needs.
    InsufficientHistory,
    /// Previous close is zero, so the change cannot be computed.
    ZeroBaseline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationFailure {
    pub ticker: String,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversificationReport {
    pub overexposed: bool,
    pub dominant_sector: Option<String>,
    /// Share of valued rows held in the dominant sector, `0.0..=1.0`.
    pub share: f64,
}
