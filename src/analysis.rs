use itertools::Itertools;

use crate::{
    model::{Price, RiskLabel, Trades, TrendLabel},
    utils::{least_squares_slope, std_dev},
};

pub const HIGH_RISK_VOLATILITY: f64 = 0.03;
pub const MEDIUM_RISK_VOLATILITY: f64 = 0.015;

pub fn closes(trades: &Trades) -> Vec<Price> {
    trades.values().map(|d| d.close).collect()
}

/// Percentage change from `previous` to `latest`; `None` on a zero baseline.
pub fn change_pct(latest: Price, previous: Price) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((latest - previous) / previous * 100.0)
}

/// Day-over-day fractional returns. Pairs with a zero prior close are skipped.
pub fn daily_returns(closes: &[Price]) -> Vec<f64> {
    closes
        .iter()
        .tuple_windows()
        .map(|(prev, next)| (next - prev) / prev)
        .filter(|r| r.is_finite())
        .collect()
}

pub fn trend(closes: &[Price]) -> Option<TrendLabel> {
    let slope = least_squares_slope(closes)?;

    Some(if slope > 0.0 {
        TrendLabel::Uptrend
    } else {
        TrendLabel::Downtrend
    })
}

pub fn volatility(closes: &[Price]) -> Option<f64> {
    std_dev(&daily_returns(closes))
}

impl RiskLabel {
    /// Buckets a volatility of fractional returns (not percent).
    pub fn from_volatility(volatility: f64) -> Self {
        if volatility > HIGH_RISK_VOLATILITY {
            RiskLabel::High
        } else if volatility > MEDIUM_RISK_VOLATILITY {
            RiskLabel::Medium
        } else {
            RiskLabel::Low
        }
    }
}

pub fn risk(closes: &[Price]) -> RiskLabel {
    volatility(closes).map_or(RiskLabel::InsufficientData, RiskLabel::from_volatility)
}
