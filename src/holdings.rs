use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, ValuationError},
    model::{HoldingEntry, StockMarket},
};

/// Upper-cases a user-entered symbol and appends the market suffix when
/// the symbol does not already carry one.
pub fn normalize_ticker(raw: &str, market: StockMarket) -> String {
    let symbol = raw.trim().to_uppercase();

    match market.suffix() {
        Some(suffix) if !symbol.is_empty() && !symbol.contains('.') => format!("{symbol}{suffix}"),
        _ => symbol,
    }
}

/// Session holdings. Entries are only ever appended.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct HoldingsStore {
    entries: Vec<HoldingEntry>,
}

impl HoldingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HoldingEntry) {
        log::debug!("append holding {} x{}", entry.ticker, entry.quantity);
        self.entries.push(entry);
    }

    /// Normalizes `raw` for `market` and appends it.
    pub fn add(&mut self, raw: &str, quantity: i64, market: StockMarket) {
        self.append(HoldingEntry::new(normalize_ticker(raw, market), quantity));
    }

    pub fn entries(&self) -> &[HoldingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct tickers in first-seen order.
    pub fn tickers(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.ticker.clone())
            .unique()
            .collect()
    }

    /// One entry per ticker with summed quantities, in first-seen order.
    pub fn aggregated(&self) -> Result<Vec<HoldingEntry>> {
        aggregate(&self.entries)
    }
}

pub fn aggregate(entries: &[HoldingEntry]) -> Result<Vec<HoldingEntry>> {
    let mut merged: Vec<HoldingEntry> = Vec::new();

    for entry in entries {
        match merged.iter_mut().find(|m| m.ticker == entry.ticker) {
            Some(m) => {
                m.quantity = m.quantity.checked_add(entry.quantity).ok_or_else(|| {
                    ValuationError::QuantityOverflow {
                        ticker: entry.ticker.clone(),
                    }
                })?;
            }
            None => merged.push(entry.clone()),
        }
    }

    Ok(merged)
}
