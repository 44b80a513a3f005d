mod cli;

use clap::Parser;
use serde::Serialize;

use portfolio_tracker::{
    loader::{load_sectors, CsvDirectorySource, MarketDataSource},
    model::{DiversificationReport, PortfolioSummary, StockMarket, ValuationFailure},
    notifier::{dispatch, signal_alerts, LogNotifier, Notifier, TelegramNotifier},
    EngineConfig, HoldingsStore, MoverScanner, ValuationEngine, Variant,
};

use crate::cli::{Cli, Commands, MoversArgs, ValueArgs};

#[derive(Serialize)]
struct ValuationReport {
    summary: PortfolioSummary,
    failures: Vec<ValuationFailure>,
    diversification: Option<DiversificationReport>,
}

fn currency(market: StockMarket) -> &'static str {
    match market {
        StockMarket::Global => "$",
        StockMarket::Nse | StockMarket::Bse => "₹",
    }
}

fn main() -> eyre::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    log::info!("Command line input recorded: {cli:?}");

    match cli.command {
        Commands::Value(args) => value(args),
        Commands::Movers(args) => movers(args),
    }
}

fn value(args: ValueArgs) -> eyre::Result<()> {
    let mut config = EngineConfig::for_variant(Variant::from(args.variant))
        .with_aggregate_duplicates(args.merge);
    if let Some(window) = args.window {
        config = config.with_window(window);
    }
    if let Some(mode) = args.signal_mode {
        config = config.with_signal_mode(mode.into());
    }
    let engine = ValuationEngine::new(config)?;
    let market = engine.config().market;

    let mut store = HoldingsStore::new();
    for holding in &args.holdings {
        store.add(&holding.ticker, holding.quantity, market);
    }

    let source = CsvDirectorySource::new(&args.data);
    let history = source.history(&store.tickers(), engine.config().window);
    let (summary, failures) = engine.compute_valuation(store.entries(), &history)?;

    let diversification = if engine.config().capabilities.diversification {
        let sectors = args
            .sectors
            .map(|path| load_sectors(path, market))
            .transpose()?
            .unwrap_or_default();
        Some(engine.check_diversification(&summary, &sectors))
    } else {
        None
    };

    if args.notify {
        let notifier: Box<dyn Notifier> = match TelegramNotifier::from_env() {
            Ok(telegram) => Box::new(telegram),
            Err(e) => {
                log::warn!("{e:#}; logging signals instead");
                Box::new(LogNotifier)
            }
        };
        for message in signal_alerts(&summary) {
            dispatch(notifier.as_ref(), &message);
        }
    }

    let report = ValuationReport {
        summary,
        failures,
        diversification,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, currency(market));
    }

    Ok(())
}

fn print_report(report: &ValuationReport, symbol: &str) {
    println!(
        "{:<14} {:>8} {:>12} {:>14} {:>9} {:>10} {:>7} {:>8}",
        "Ticker", "Quantity", "Price", "Value", "% Change", "Trend", "Risk", "Signal"
    );
    for row in &report.summary.rows {
        println!(
            "{:<14} {:>8} {:>12} {:>14} {:>8.2}% {:>10} {:>7} {:>8}",
            row.ticker,
            row.quantity,
            format!("{symbol}{:.2}", row.latest_price),
            format!("{symbol}{:.2}", row.position_value),
            row.change_pct,
            row.trend.to_string(),
            row.risk.to_string(),
            row.signal.map(|s| s.to_string()).unwrap_or_default(),
        );
    }

    for failure in &report.failures {
        println!("Error loading data for {}: {}", failure.ticker, failure.reason);
    }

    println!("Total Portfolio Value: {symbol}{:.2}", report.summary.total_value);

    if let Some(DiversificationReport {
        overexposed: true,
        dominant_sector,
        share,
    }) = &report.diversification
    {
        println!(
            "Your portfolio may be overexposed to {} ({:.0}% of holdings). Consider diversifying.",
            dominant_sector.as_deref().unwrap_or("one sector"),
            share * 100.0
        );
    }
}

fn movers(args: MoversArgs) -> eyre::Result<()> {
    let variant = Variant::from(args.variant);
    let market = EngineConfig::for_variant(variant).market;

    let watchlist = args
        .tickers
        .iter()
        .map(|t| portfolio_tracker::holdings::normalize_ticker(t, market))
        .collect::<Vec<_>>();

    let source = CsvDirectorySource::new(&args.data);
    let movers = MoverScanner::for_variant(variant)?.scan(&watchlist, &source);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&movers)?);
        return Ok(());
    }

    if movers.is_empty() {
        println!("No market movers in the watchlist.");
    }
    for mover in &movers {
        let pct = |v: Option<f64>| v.map(|v| format!("{v:+.2}%")).unwrap_or_else(|| "n/a".into());
        println!(
            "{:<14} price {:>9} volume {:>9} ({})",
            mover.ticker,
            pct(mover.price_change_pct),
            pct(mover.volume_change_pct),
            mover
                .reasons
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}
