use chrono::NaiveDate;
use itertools::Itertools;

use crate::{
    analysis::closes,
    config::SignalMode,
    model::{Price, SignalLabel, Trades},
    utils::ema_series,
};

/// Bars needed before a signal is reported: the EMA's last two points
/// must both follow at least one smoothing step.
pub const MIN_SIGNAL_BARS: usize = 3;

pub trait Strategy {
    fn buy(&self, trades: &Trades) -> Vec<(NaiveDate, Price)>;
    fn sell(&self, trades: &Trades) -> Vec<(NaiveDate, Price)>;

    /// Signal on the most recent bar.
    fn signal(&self, trades: &Trades) -> SignalLabel {
        let Some((last, _)) = trades.last_key_value() else {
            return SignalLabel::InsufficientData;
        };
        if trades.len() < MIN_SIGNAL_BARS {
            return SignalLabel::InsufficientData;
        }

        let on_last = |points: Vec<(NaiveDate, Price)>| points.iter().any(|(date, _)| date == last);

        match (on_last(self.buy(trades)), on_last(self.sell(trades))) {
            (true, false) => SignalLabel::Buy,
            (false, true) => SignalLabel::Sell,
            _ => SignalLabel::Hold,
        }
    }
}

pub fn for_mode(mode: SignalMode, length: usize) -> Box<dyn Strategy> {
    match mode {
        SignalMode::Crossover => Box::new(EmaCrossoverStrategy { length }),
        SignalMode::Position => Box::new(EmaPositionStrategy { length }),
    }
}

/// Pairs each bar with the EMA of closes up to and including it.
fn with_ema(trades: &Trades, length: usize) -> Vec<(NaiveDate, Price, f64)> {
    let ema = ema_series(&closes(trades), length);

    trades
        .iter()
        .zip(ema)
        .map(|((date, data), ema)| (*date, data.close, ema))
        .collect()
}

/// buy: close crosses above its EMA
/// sell: close crosses below its EMA
pub struct EmaCrossoverStrategy {
    pub length: usize,
}

impl EmaCrossoverStrategy {
    fn crossings(&self, trades: &Trades, upward: bool) -> Vec<(NaiveDate, Price)> {
        with_ema(trades, self.length)
            .into_iter()
            .tuple_windows()
            .filter(|((_, prev_close, prev_ema), (_, close, ema))| {
                if upward {
                    prev_close < prev_ema && close > ema
                } else {
                    prev_close > prev_ema && close < ema
                }
            })
            .map(|(_, (date, close, _))| (date, close))
            .collect()
    }
}

impl Strategy for EmaCrossoverStrategy {
    fn buy(&self, trades: &Trades) -> Vec<(NaiveDate, Price)> {
        self.crossings(trades, true)
    }

    fn sell(&self, trades: &Trades) -> Vec<(NaiveDate, Price)> {
        self.crossings(trades, false)
    }
}

/// buy: close is above its EMA
/// sell: close is at or below its EMA
pub struct EmaPositionStrategy {
    pub length: usize,
}

impl Strategy for EmaPositionStrategy {
    fn buy(&self, trades: &Trades) -> Vec<(NaiveDate, Price)> {
        with_ema(trades, self.length)
            .into_iter()
            .filter(|(_, close, ema)| close > ema)
            .map(|(date, close, _)| (date, close))
            .collect()
    }

    fn sell(&self, trades: &Trades) -> Vec<(NaiveDate, Price)> {
        with_ema(trades, self.length)
            .into_iter()
            .filter(|(_, close, ema)| close <= ema)
            .map(|(date, close, _)| (date, close))
            .collect()
    }
}
