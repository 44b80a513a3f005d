use derive_more::Display;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    analysis::change_pct,
    config::{EngineConfig, MoverConfig, Variant},
    error::{Result, ValuationError},
    loader::MarketDataSource,
    model::{PriceHistory, Trades},
    utils::MovingAverage,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum MoverReason {
    #[display(fmt = "price move")]
    PriceMove,
    #[display(fmt = "volume above trailing average")]
    VolumeSpike,
    #[display(fmt = "volume jump")]
    VolumeJump,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoverRecord {
    pub ticker: String,
    pub price_change_pct: Option<f64>,
    pub volume_change_pct: Option<f64>,
    /// Last volume over the average of the earlier bars in the window.
    pub volume_ratio: Option<f64>,
    pub reasons: Vec<MoverReason>,
}

pub struct MoverScanner {
    config: MoverConfig,
}

impl MoverScanner {
    pub fn new(config: MoverConfig) -> Self {
        Self { config }
    }

    /// Scanner with the variant's thresholds. Fails for variants that do
    /// not ship the movers tab.
    pub fn for_variant(variant: Variant) -> Result<Self> {
        if !EngineConfig::for_variant(variant).capabilities.movers {
            return Err(ValuationError::CapabilityDisabled {
                capability: "movers",
                variant,
            });
        }
        Ok(Self::new(MoverConfig::for_variant(variant)))
    }

    /// Fetches and scans each watchlist ticker. Tickers that fail to load are
    /// logged and skipped. Output keeps watchlist order.
    pub fn scan(&self, watchlist: &[String], source: &dyn MarketDataSource) -> Vec<MoverRecord> {
        watchlist
            .iter()
            .filter_map(|ticker| match source.fetch(ticker, self.config.window) {
                Ok(trades) => self.evaluate(ticker, &trades),
                Err(e) => {
                    log::warn!("[{ticker}] mover scan skipped: {e:#}");
                    None
                }
            })
            .collect()
    }

    /// Same as [`scan`](Self::scan) over an already fetched history.
    pub fn scan_history(&self, watchlist: &[String], history: &PriceHistory) -> Vec<MoverRecord> {
        watchlist
            .iter()
            .filter_map(|ticker| match history.get(ticker) {
                Some(trades) => self.evaluate(ticker, trades),
                None => {
                    log::warn!("[{ticker}] mover scan skipped: no data");
                    None
                }
            })
            .collect()
    }

    fn evaluate(&self, ticker: &str, trades: &Trades) -> Option<MoverRecord> {
        let window = trades
            .values()
            .skip(trades.len().saturating_sub(self.config.window))
            .collect_vec();

        let [earlier @ .., prev, last] = window.as_slice() else {
            log::warn!("[{ticker}] mover scan skipped: {} bars", window.len());
            return None;
        };

        let price_change_pct = change_pct(last.close, prev.close);
        let volume_change_pct = change_pct(last.volume as f64, prev.volume as f64);

        let mut average = MovingAverage::default();
        for bar in earlier.iter().chain([prev]) {
            average.feed(bar.volume as f64, 1);
        }
        let volume_ratio = average
            .avg()
            .filter(|avg| *avg > 0.0)
            .map(|avg| last.volume as f64 / avg);

        let mut reasons = Vec::new();
        if price_change_pct.is_some_and(|p| p.abs() > self.config.price_change_pct) {
            reasons.push(MoverReason::PriceMove);
        }
        if volume_ratio.is_some_and(|r| r > self.config.volume_multiple) {
            reasons.push(MoverReason::VolumeSpike);
        }
        if volume_change_pct.is_some_and(|v| v > self.config.volume_change_pct) {
            reasons.push(MoverReason::VolumeJump);
        }

        if reasons.is_empty() {
            return None;
        }

        log::debug!("[{ticker}] mover: {}", reasons.iter().join(", "));

        Some(MoverRecord {
            ticker: ticker.to_owned(),
            price_change_pct,
            volume_change_pct,
            volume_ratio,
            reasons,
        })
    }
}
