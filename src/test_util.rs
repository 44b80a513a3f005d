use chrono::{Days, NaiveDate};

use crate::model::{DaySeriesData, Trades};

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() <= e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;

pub fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(offset)
}

pub fn bar(close: f64, volume: usize) -> DaySeriesData {
    DaySeriesData {
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

/// Consecutive daily bars with the given closes and a flat volume.
pub fn trades(closes: &[f64]) -> Trades {
    closes
        .iter()
        .enumerate()
        .map(|(ix, &close)| (day(ix as u64), bar(close, 1_000)))
        .collect()
}

/// Consecutive daily bars from `(close, volume)` pairs.
pub fn trades_with_volume(bars: &[(f64, usize)]) -> Trades {
    bars.iter()
        .enumerate()
        .map(|(ix, &(close, volume))| (day(ix as u64), bar(close, volume)))
        .collect()
}
