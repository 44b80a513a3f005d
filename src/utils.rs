use crate::model::Price;

#[derive(Default)]
pub struct MovingAverage {
    value: Price,
    length: usize,
}

impl MovingAverage {
    pub fn feed(&mut self, value: Price, times: usize) {
        self.value += value * times as Price;
        self.length += times;
    }

    pub fn clear(&mut self) {
        self.value = Price::default();
        self.length = 0;
    }

    pub fn avg(&self) -> Option<f64> {
        if self.length == 0 {
            return None;
        }
        Some(self.value / self.length as Price)
    }
}

/// Slope of the first-degree least-squares fit of `values` against `0..n`.
///
/// Needs at least two points.
pub fn least_squares_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let (numerator, denominator) =
        values
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (x, y)| {
                let dx = x as f64 - x_mean;
                (num + dx * (y - y_mean), den + dx * dx)
            });

    Some(numerator / denominator)
}

/// Population standard deviation (divides by `n`).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some(variance.sqrt())
}

/// Exponential moving average seeded with the first value.
///
/// `ema[0] = values[0]`, `ema[i] = α·values[i] + (1 − α)·ema[i − 1]`
/// with `α = 2 / (length + 1)`.
pub fn ema_series(values: &[f64], length: usize) -> Vec<f64> {
    let alpha = 2.0 / (length as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());

    for &value in values {
        let next = match result.last() {
            Some(&prev) => alpha * value + (1.0 - alpha) * prev,
            None => value,
        };
        result.push(next);
    }

    result
}
