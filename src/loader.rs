use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use eyre::{eyre, WrapErr};
use itertools::Itertools;

use crate::{
    holdings::normalize_ticker,
    model::{DaySeriesData, PriceHistory, StockMarket, Trades},
};

/// Supplier of daily bars.
pub trait MarketDataSource {
    /// The trailing `window` bars of `ticker`, oldest first.
    fn fetch(&self, ticker: &str, window: usize) -> eyre::Result<Trades>;

    /// Batch fetch. Tickers that fail are left out of the result.
    fn history(&self, tickers: &[String], window: usize) -> PriceHistory {
        tickers
            .iter()
            .unique()
            .filter_map(|ticker| match self.fetch(ticker, window) {
                Ok(trades) => Some((ticker.clone(), trades)),
                Err(e) => {
                    log::warn!("[{ticker}] fetch failed: {e:#}");
                    None
                }
            })
            .collect()
    }
}

/// Keeps the last `window` bars.
pub fn trailing(trades: Trades, window: usize) -> Trades {
    let skip = trades.len().saturating_sub(window);
    trades.into_iter().skip(skip).collect()
}

/// Reads `<root>/<TICKER>.csv` files with a `Date,Open,High,Low,Close,Volume` header.
pub struct CsvDirectorySource {
    root: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl MarketDataSource for CsvDirectorySource {
    fn fetch(&self, ticker: &str, window: usize) -> eyre::Result<Trades> {
        let path = self.root.join(format!("{ticker}.csv"));
        let trades = load_stock_trades(&path, 5)
            .wrap_err_with(|| format!("failed to load {}", path.display()))?;

        Ok(trailing(trades, window))
    }
}

pub struct InMemorySource {
    history: PriceHistory,
}

impl InMemorySource {
    pub fn new(history: PriceHistory) -> Self {
        Self { history }
    }
}

impl MarketDataSource for InMemorySource {
    fn fetch(&self, ticker: &str, window: usize) -> eyre::Result<Trades> {
        let trades = self
            .history
            .get(ticker)
            .ok_or_else(|| eyre!("no data for {ticker}"))?;

        Ok(trailing(trades.clone(), window))
    }
}

fn load_stock_trades(path: impl AsRef<Path>, volume_position: usize) -> eyre::Result<Trades> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut trades = Trades::new();

    for line in reader.lines().skip(1) {
        let line = line?;
        let splits = line.split(',').map(str::trim).collect_vec();

        // holidays and suspended sessions come through as empty rows
        if splits.len() <= volume_position || splits[1].is_empty() {
            continue;
        }

        let date = NaiveDate::parse_from_str(splits[0], "%Y-%m-%d")?;
        let volume = splits[volume_position].parse::<f64>()?;
        if !volume.is_finite() || volume < 0.0 {
            return Err(eyre!("invalid volume {volume} on {date}"));
        }

        trades.insert(
            date,
            DaySeriesData {
                open: splits[1].parse()?,
                high: splits[2].parse()?,
                low: splits[3].parse()?,
                close: splits[4].parse()?,
                volume: volume as usize,
            },
        );
    }

    let trades = trades
        .into_iter()
        .filter(|(_, d)| d.open != 0f64 && d.close != 0f64)
        .collect();

    Ok(trades)
}

/// Reads a `Ticker,Sector` file into a lookup table keyed by tickers
/// normalized for `market`, matching the holdings they describe.
pub fn load_sectors(
    path: impl AsRef<Path>,
    market: StockMarket,
) -> eyre::Result<HashMap<String, String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut sectors = HashMap::new();

    for line in reader.lines().skip(1) {
        let line = line?;
        let Some((ticker, sector)) = line.split_once(',') else {
            continue;
        };
        sectors.insert(normalize_ticker(ticker, market), sector.trim().to_owned());
    }

    Ok(sectors)
}
