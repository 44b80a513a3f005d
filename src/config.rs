use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};
use crate::model::StockMarket;

/// How the per-holding signal is derived from the close/EMA pair.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalMode {
    /// Buy/Sell only on the bar where close crosses its EMA.
    #[default]
    Crossover,
    /// Buy while close sits above its EMA, Sell otherwise.
    Position,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub ema_signal: bool,
    pub diversification: bool,
    pub movers: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            ema_signal: true,
            diversification: true,
            movers: false,
        }
    }
}

/// Named deployments of the tracker. They differ only in configuration.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Global,
    India,
    IndiaSignals,
    IndiaMovers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub market: StockMarket,
    pub capabilities: Capabilities,
    pub signal_mode: SignalMode,
    pub ema_length: usize,
    /// Trailing bars requested from the data source per pass.
    pub window: usize,
    /// Rows whose sector exceeds this share of the portfolio are overexposed.
    pub sector_limit: f64,
    pub aggregate_duplicates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            market: StockMarket::Global,
            capabilities: Capabilities::default(),
            signal_mode: SignalMode::Crossover,
            ema_length: 9,
            window: 7,
            sector_limit: 0.6,
            aggregate_duplicates: false,
        }
    }
}

impl EngineConfig {
    pub fn for_variant(variant: Variant) -> Self {
        let config = Self::default();

        match variant {
            Variant::Global => config.with_capabilities(Capabilities {
                ema_signal: false,
                diversification: true,
                movers: false,
            }),
            Variant::India => config.with_market(StockMarket::Nse).with_capabilities(Capabilities {
                ema_signal: false,
                diversification: false,
                movers: false,
            }),
            Variant::IndiaSignals => config
                .with_market(StockMarket::Nse)
                .with_window(22)
                .with_signal_mode(SignalMode::Position)
                .with_capabilities(Capabilities {
                    ema_signal: true,
                    diversification: false,
                    movers: false,
                }),
            Variant::IndiaMovers => config
                .with_market(StockMarket::Nse)
                .with_window(22)
                .with_capabilities(Capabilities {
                    ema_signal: true,
                    diversification: false,
                    movers: true,
                }),
        }
    }

    pub fn with_market(mut self, value: StockMarket) -> Self {
        self.market = value;
        self
    }

    pub fn with_capabilities(mut self, value: Capabilities) -> Self {
        self.capabilities = value;
        self
    }

    pub fn with_signal_mode(mut self, value: SignalMode) -> Self {
        self.signal_mode = value;
        self
    }

    pub fn with_ema_length(mut self, value: usize) -> Self {
        self.ema_length = value;
        self
    }

    pub fn with_window(mut self, value: usize) -> Self {
        self.window = value;
        self
    }

    pub fn with_sector_limit(mut self, value: f64) -> Self {
        self.sector_limit = value;
        self
    }

    pub fn with_aggregate_duplicates(mut self, value: bool) -> Self {
        self.aggregate_duplicates = value;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.ema_length == 0 {
            return Err(ValuationError::Config("ema_length must be at least 1".into()));
        }
        if self.window < 2 {
            return Err(ValuationError::Config(format!(
                "window must cover at least 2 bars, got {}",
                self.window
            )));
        }
        if !(0.0..=1.0).contains(&self.sector_limit) {
            return Err(ValuationError::Config(format!(
                "sector_limit must be within 0..=1, got {}",
                self.sector_limit
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoverConfig {
    pub window: usize,
    /// Absolute day-over-day price move, in percent.
    pub price_change_pct: f64,
    /// Last volume over the trailing average volume.
    pub volume_multiple: f64,
    /// Day-over-day volume increase, in percent.
    pub volume_change_pct: f64,
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            window: 5,
            price_change_pct: 2.0,
            volume_multiple: 2.0,
            volume_change_pct: 100.0,
        }
    }
}

impl MoverConfig {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::IndiaMovers => Self::default().with_price_change_pct(5.0),
            _ => Self::default(),
        }
    }

    pub fn with_window(mut self, value: usize) -> Self {
        self.window = value;
        self
    }

    pub fn with_price_change_pct(mut self, value: f64) -> Self {
        self.price_change_pct = value;
        self
    }

    pub fn with_volume_multiple(mut self, value: f64) -> Self {
        self.volume_multiple = value;
        self
    }

    pub fn with_volume_change_pct(mut self, value: f64) -> Self {
        self.volume_change_pct = value;
        self
    }
}
