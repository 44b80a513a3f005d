use std::collections::HashMap;

use crate::{
    analysis::{self, closes},
    config::EngineConfig,
    error::{Result, ValuationError},
    holdings::aggregate,
    model::{
        DiversificationReport, FailureReason, HoldingEntry, PortfolioSummary, PriceHistory,
        Trades, ValuationFailure, ValuationRow,
    },
    strategy::{self, Strategy},
};

pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Turns holdings plus a price history snapshot into valuation rows.
///
/// The engine holds no state between passes; every call is computed from
/// its arguments alone.
pub struct ValuationEngine {
    config: EngineConfig,
}

impl ValuationEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Values every holding against `history`.
    ///
    /// Holdings without usable data end up in the returned failure list and
    /// do not contribute to the total. A malformed holding fails the call.
    pub fn compute_valuation(
        &self,
        holdings: &[HoldingEntry],
        history: &PriceHistory,
    ) -> Result<(PortfolioSummary, Vec<ValuationFailure>)> {
        validate(holdings)?;

        let merged;
        let holdings = if self.config.aggregate_duplicates {
            merged = aggregate(holdings)?;
            merged.as_slice()
        } else {
            holdings
        };

        let strategy = self
            .config
            .capabilities
            .ema_signal
            .then(|| strategy::for_mode(self.config.signal_mode, self.config.ema_length));

        let mut summary = PortfolioSummary::default();
        let mut failures = Vec::new();

        for entry in holdings {
            let outcome = match history.get(&entry.ticker) {
                Some(trades) => value_holding(entry, trades, strategy.as_deref()),
                None => Err(FailureReason::NoData),
            };

            match outcome {
                Ok(row) => {
                    summary.total_value += row.position_value;
                    summary.rows.push(row);
                }
                Err(reason) => {
                    log::warn!("[{}] valuation skipped: {reason}", entry.ticker);
                    failures.push(ValuationFailure {
                        ticker: entry.ticker.clone(),
                        reason,
                    });
                }
            }
        }

        log::info!(
            "valued {} of {} holdings, total {:.2}",
            summary.rows.len(),
            holdings.len(),
            summary.total_value
        );

        Ok((summary, failures))
    }

    /// Flags the portfolio when one sector holds more than the configured
    /// share of valued rows. Tickers missing from `sectors` count as
    /// [`UNKNOWN_SECTOR`].
    pub fn check_diversification(
        &self,
        summary: &PortfolioSummary,
        sectors: &HashMap<String, String>,
    ) -> DiversificationReport {
        let total = summary.rows.len();
        let mut counts: Vec<(&str, usize)> = Vec::new();

        for row in &summary.rows {
            let sector = sectors
                .get(&row.ticker)
                .map_or(UNKNOWN_SECTOR, String::as_str);

            match counts.iter_mut().find(|(s, _)| *s == sector) {
                Some((_, count)) => *count += 1,
                None => counts.push((sector, 1)),
            }
        }

        // first sector wins ties
        let dominant = counts
            .into_iter()
            .fold(None::<(&str, usize)>, |best, (sector, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((sector, count)),
            });

        match dominant {
            Some((sector, count)) => {
                let share = count as f64 / total as f64;
                let overexposed = count as f64 > total as f64 * self.config.sector_limit;
                if overexposed {
                    log::warn!("portfolio overexposed to {sector} ({count} of {total} holdings)");
                }

                DiversificationReport {
                    overexposed,
                    dominant_sector: Some(sector.to_owned()),
                    share,
                }
            }
            None => DiversificationReport {
                overexposed: false,
                dominant_sector: None,
                share: 0.0,
            },
        }
    }
}

fn validate(holdings: &[HoldingEntry]) -> Result<()> {
    for (index, entry) in holdings.iter().enumerate() {
        if entry.ticker.trim().is_empty() {
            return Err(ValuationError::EmptyTicker { index });
        }
        if entry.quantity <= 0 {
            return Err(ValuationError::NonPositiveQuantity {
                ticker: entry.ticker.clone(),
                quantity: entry.quantity,
            });
        }
    }
    Ok(())
}

fn value_holding(
    entry: &HoldingEntry,
    trades: &Trades,
    strategy: Option<&dyn Strategy>,
) -> std::result::Result<ValuationRow, FailureReason> {
    let closes = closes(trades);

    let (previous_close, latest_price) = match closes.as_slice() {
        [] => return Err(FailureReason::NoData),
        [_] => return Err(FailureReason::InsufficientHistory),
        [.., previous, latest] => (*previous, *latest),
    };

    let change_pct = analysis::change_pct(latest_price, previous_close)
        .ok_or(FailureReason::ZeroBaseline)?;
    let trend = analysis::trend(&closes).ok_or(FailureReason::InsufficientHistory)?;

    let quantity = entry.quantity as f64;

    Ok(ValuationRow {
        ticker: entry.ticker.clone(),
        quantity: entry.quantity,
        latest_price,
        previous_close,
        change_pct,
        day_change: (latest_price - previous_close) * quantity,
        position_value: quantity * latest_price,
        trend,
        risk: analysis::risk(&closes),
        signal: strategy.map(|s| s.signal(trades)),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::ValuationEngine;
    use crate::{
        config::{Capabilities, EngineConfig, SignalMode},
        error::ValuationError,
        model::{
            FailureReason, HoldingEntry, PriceHistory, RiskLabel, SignalLabel, TrendLabel,
            ValuationFailure,
        },
        test_util::{assert_approx, trades},
    };

    fn engine() -> ValuationEngine {
        ValuationEngine::new(EngineConfig::default()).unwrap()
    }

    fn history(series: &[(&str, &[f64])]) -> PriceHistory {
        series
            .iter()
            .map(|(ticker, closes)| (ticker.to_string(), trades(closes)))
            .collect()
    }

    #[test]
    fn two_bar_holding_is_valued() -> eyre::Result<()> {
        let holdings = vec![HoldingEntry::new("XYZ", 10)];
        let (summary, failures) =
            engine().compute_valuation(&holdings, &history(&[("XYZ", &[100.0, 105.0])]))?;

        assert!(failures.is_empty());
        let row = &summary.rows[0];
        assert_approx!(row.change_pct, 5.0);
        assert_eq!(row.position_value, 1050.0);
        assert_eq!(row.day_change, 50.0);
        assert_eq!(row.trend, TrendLabel::Uptrend);
        assert_eq!(row.risk, RiskLabel::Low);
        assert_eq!(row.signal, Some(SignalLabel::InsufficientData));
        assert_eq!(summary.total_value, 1050.0);

        Ok(())
    }

    #[test]
    fn missing_ticker_is_reported_not_valued() -> eyre::Result<()> {
        let holdings = vec![HoldingEntry::new("ABC", 5)];
        let (summary, failures) = engine().compute_valuation(&holdings, &PriceHistory::new())?;

        assert!(summary.rows.is_empty());
        assert_eq!(summary.total_value, 0.0);
        assert_eq!(
            failures,
            vec![ValuationFailure {
                ticker: "ABC".into(),
                reason: FailureReason::NoData
            }]
        );

        Ok(())
    }

    #[test]
    fn failing_holdings_never_change_the_total() -> eyre::Result<()> {
        let data = history(&[
            ("A", &[10.0, 11.0, 12.0]),
            ("B", &[50.0, 49.0]),
            ("ONE", &[7.0]),
            ("ZERO", &[0.0, 3.0]),
            ("EMPTY", &[]),
        ]);
        let base = vec![HoldingEntry::new("A", 3), HoldingEntry::new("B", 2)];
        let (clean, _) = engine().compute_valuation(&base, &data)?;

        let mut noisy = base.clone();
        noisy.insert(1, HoldingEntry::new("ONE", 4));
        noisy.push(HoldingEntry::new("ZERO", 1));
        noisy.push(HoldingEntry::new("EMPTY", 1));
        noisy.push(HoldingEntry::new("GONE", 1));
        let (summary, failures) = engine().compute_valuation(&noisy, &data)?;

        assert_eq!(summary.total_value, clean.total_value);
        assert_eq!(summary.total_value, 3.0 * 12.0 + 2.0 * 49.0);
        assert_eq!(
            failures.iter().map(|f| (f.ticker.as_str(), f.reason)).collect::<Vec<_>>(),
            vec![
                ("ONE", FailureReason::InsufficientHistory),
                ("ZERO", FailureReason::ZeroBaseline),
                ("EMPTY", FailureReason::NoData),
                ("GONE", FailureReason::NoData),
            ]
        );
        assert_eq!(
            summary.rows.iter().map(|r| r.ticker.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );

        Ok(())
    }

    #[test]
    fn change_sign_matches_price_move() -> eyre::Result<()> {
        let holdings = vec![HoldingEntry::new("UP", 1), HoldingEntry::new("DOWN", 1)];
        let data = history(&[("UP", &[10.0, 9.0, 9.5]), ("DOWN", &[10.0, 11.0, 10.5])]);
        let (summary, _) = engine().compute_valuation(&holdings, &data)?;

        assert!(summary.rows[0].change_pct > 0.0);
        assert!(summary.rows[1].change_pct < 0.0);
        assert!(summary.rows.iter().all(|r| r.change_pct.is_finite()));

        Ok(())
    }

    #[test]
    fn non_positive_quantity_fails_the_whole_call() {
        let data = history(&[("A", &[1.0, 2.0])]);
        let holdings = vec![HoldingEntry::new("A", 1), HoldingEntry::new("A", -2)];

        assert_eq!(
            engine().compute_valuation(&holdings, &data),
            Err(ValuationError::NonPositiveQuantity {
                ticker: "A".into(),
                quantity: -2
            })
        );
        assert_eq!(
            engine().compute_valuation(&[HoldingEntry::new(" ", 1)], &data),
            Err(ValuationError::EmptyTicker { index: 0 })
        );
    }

    #[test]
    fn duplicates_are_valued_separately_or_merged() -> eyre::Result<()> {
        let data = history(&[("A", &[1.0, 2.0])]);
        let holdings = vec![HoldingEntry::new("A", 1), HoldingEntry::new("A", 4)];

        let (separate, _) = engine().compute_valuation(&holdings, &data)?;
        assert_eq!(separate.rows.len(), 2);
        assert_eq!(separate.total_value, 10.0);

        let merging =
            ValuationEngine::new(EngineConfig::default().with_aggregate_duplicates(true))?;
        let (merged, _) = merging.compute_valuation(&holdings, &data)?;
        assert_eq!(merged.rows.len(), 1);
        assert_eq!(merged.rows[0].quantity, 5);
        assert_eq!(merged.total_value, 10.0);

        Ok(())
    }

    #[test]
    fn merge_overflow_fails_the_whole_call() -> eyre::Result<()> {
        let data = history(&[("A", &[1.0, 2.0])]);
        let holdings = vec![HoldingEntry::new("A", i64::MAX), HoldingEntry::new("A", 1)];
        let merging =
            ValuationEngine::new(EngineConfig::default().with_aggregate_duplicates(true))?;

        assert_eq!(
            merging.compute_valuation(&holdings, &data),
            Err(ValuationError::QuantityOverflow { ticker: "A".into() })
        );

        // without merging both rows are valued on their own
        let (summary, failures) = engine().compute_valuation(&holdings, &data)?;
        assert_eq!(summary.rows.len(), 2);
        assert!(failures.is_empty());

        Ok(())
    }

    #[test]
    fn position_mode_signals_close_above_ema() -> eyre::Result<()> {
        let config = EngineConfig::default().with_signal_mode(SignalMode::Position);
        let engine = ValuationEngine::new(config)?;
        let data = history(&[("UP", &[100.0, 101.0, 102.0]), ("DOWN", &[100.0, 99.0, 98.0])]);
        let holdings = vec![HoldingEntry::new("UP", 1), HoldingEntry::new("DOWN", 1)];

        let (summary, _) = engine.compute_valuation(&holdings, &data)?;
        assert_eq!(summary.rows[0].signal, Some(SignalLabel::Buy));
        assert_eq!(summary.rows[1].signal, Some(SignalLabel::Sell));

        // crossover mode stays quiet on the same steady climb
        let (summary, _) = ValuationEngine::new(EngineConfig::default())?
            .compute_valuation(&holdings, &data)?;
        assert_eq!(summary.rows[0].signal, Some(SignalLabel::Hold));

        Ok(())
    }

    #[test]
    fn signal_is_absent_when_capability_is_off() -> eyre::Result<()> {
        let config = EngineConfig::default().with_capabilities(Capabilities {
            ema_signal: false,
            diversification: true,
            movers: false,
        });
        let data = history(&[("A", &[100.0, 90.0, 110.0])]);
        let (summary, _) = ValuationEngine::new(config)?
            .compute_valuation(&[HoldingEntry::new("A", 1)], &data)?;
        assert_eq!(summary.rows[0].signal, None);

        let (summary, _) = engine().compute_valuation(&[HoldingEntry::new("A", 1)], &data)?;
        assert_eq!(summary.rows[0].signal, Some(SignalLabel::Buy));

        Ok(())
    }

    #[test]
    fn diversification_flags_dominant_sector() -> eyre::Result<()> {
        let data = history(&[
            ("A", &[1.0, 2.0]),
            ("B", &[1.0, 2.0]),
            ("C", &[1.0, 2.0]),
            ("D", &[1.0, 2.0]),
        ]);
        let sectors: HashMap<String, String> = [("A", "Tech"), ("B", "Tech"), ("C", "Tech")]
            .into_iter()
            .map(|(t, s)| (t.to_string(), s.to_string()))
            .collect();
        let holdings = ["A", "B", "C", "D"].map(|t| HoldingEntry::new(t, 1));

        let (summary, _) = engine().compute_valuation(&holdings, &data)?;
        let report = engine().check_diversification(&summary, &sectors);
        assert!(report.overexposed);
        assert_eq!(report.dominant_sector.as_deref(), Some("Tech"));
        assert_eq!(report.share, 0.75);

        // 3 of 5 is exactly 60%, which is not over the limit
        let mut holdings = holdings.to_vec();
        holdings.push(HoldingEntry::new("D", 1));
        let (summary, _) = engine().compute_valuation(&holdings, &data)?;
        assert!(!engine().check_diversification(&summary, &sectors).overexposed);

        Ok(())
    }

    #[test]
    fn diversification_on_empty_portfolio() {
        let report = engine().check_diversification(&Default::default(), &HashMap::new());
        assert!(!report.overexposed);
        assert_eq!(report.dominant_sector, None);
    }

    #[test]
    fn unknown_sector_counts_as_a_sector() -> eyre::Result<()> {
        let data = history(&[("A", &[1.0, 2.0])]);
        let (summary, _) = engine().compute_valuation(&[HoldingEntry::new("A", 1)], &data)?;
        let report = engine().check_diversification(&summary, &HashMap::new());

        assert!(report.overexposed);
        assert_eq!(report.dominant_sector.as_deref(), Some(super::UNKNOWN_SECTOR));

        Ok(())
    }
}
