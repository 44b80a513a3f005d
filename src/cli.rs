use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use portfolio_tracker::{SignalMode, Variant};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Value a portfolio against locally stored daily prices.
    Value(ValueArgs),

    /// Scan a watchlist for unusual price or volume moves.
    Movers(MoversArgs),
}

#[derive(Args, Debug)]
pub struct ValueArgs {
    /// Directory holding one `<TICKER>.csv` per ticker.
    #[arg(long)]
    pub data: PathBuf,

    /// Holding as `TICKER:QUANTITY`; repeat for each holding.
    #[arg(long = "holding", value_parser = parse_holding, required = true)]
    pub holdings: Vec<HoldingArg>,

    /// `Ticker,Sector` file used by the diversification check.
    #[arg(long)]
    pub sectors: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = VariantArg::Global)]
    pub variant: VariantArg,

    /// Trailing bars to load per ticker.
    #[arg(long)]
    pub window: Option<usize>,

    /// Overrides the variant's signal mode.
    #[arg(long, value_enum)]
    pub signal_mode: Option<SignalModeArg>,

    /// Merge duplicate tickers into one row.
    #[arg(long)]
    pub merge: bool,

    /// Send Buy/Sell signals through Telegram (falls back to the log).
    #[arg(long)]
    pub notify: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct MoversArgs {
    #[arg(long)]
    pub data: PathBuf,

    #[arg(long, value_enum, default_value_t = VariantArg::IndiaMovers)]
    pub variant: VariantArg,

    #[arg(long)]
    pub json: bool,

    /// Watchlist, scanned in the given order.
    #[arg(required = true)]
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct HoldingArg {
    pub ticker: String,
    pub quantity: i64,
}

fn parse_holding(value: &str) -> Result<HoldingArg, String> {
    let (ticker, quantity) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected TICKER:QUANTITY, got `{value}`"))?;
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|e| format!("invalid quantity `{quantity}`: {e}"))?;

    Ok(HoldingArg {
        ticker: ticker.to_owned(),
        quantity,
    })
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum VariantArg {
    Global,
    India,
    IndiaSignals,
    IndiaMovers,
}

impl From<VariantArg> for Variant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Global => Variant::Global,
            VariantArg::India => Variant::India,
            VariantArg::IndiaSignals => Variant::IndiaSignals,
            VariantArg::IndiaMovers => Variant::IndiaMovers,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SignalModeArg {
    /// Buy/Sell only when the close crosses its EMA.
    Crossover,
    /// Buy while the close is above its EMA, Sell otherwise.
    Position,
}

impl From<SignalModeArg> for SignalMode {
    fn from(value: SignalModeArg) -> Self {
        match value {
            SignalModeArg::Crossover => SignalMode::Crossover,
            SignalModeArg::Position => SignalMode::Position,
        }
    }
}
