//! prophet-bot: options credit-strategy briefing engine.
//!
//! Single-binary Tokio application that:
//! 1. Synthesizes per-ticker market snapshots (live overrides when a
//!    provider is configured)
//! 2. Enumerates credit spreads and iron condors over the strategy grid
//! 3. Scores every admitted candidate with the nine-factor model
//! 4. Applies the per-ticker stability lock before presenting anything
//! 5. Publishes a global leaderboard on a fixed refresh interval

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::config::BotConfig;
use common::DataProvenance;
use market_data_client::{MarketDataProvider, OptionsDataClient};
use prophet_engine::{
    build_leaderboard, FileLockStore, LockManager, LockParams, LockStore, MemoryLockStore,
    ScanOutcome, Scanner,
};

/// Options credit-strategy briefing engine.
#[derive(Parser)]
#[command(name = "prophet-bot", about = "Options credit-strategy briefing engine")]
struct Cli {
    /// Scan a single ticker, print the report, and exit.
    #[arg(long)]
    ticker: Option<String>,

    /// Spot price for --ticker when it is not in the configured universe.
    #[arg(long)]
    spot: Option<f64>,

    /// Build the leaderboard once and exit instead of looping.
    #[arg(long)]
    once: bool,
}

fn build_scanner(config: &BotConfig) -> Result<Scanner> {
    let provider: Option<Arc<dyn MarketDataProvider>> = if config.provider.enabled {
        info!("Live provider enabled at {}", config.provider.base_url);
        Some(Arc::new(OptionsDataClient::new(&config.provider)?))
    } else {
        info!("No live provider configured — running fully simulated");
        None
    };

    let store: Arc<dyn LockStore> = match &config.lock.persist_dir {
        Some(dir) => {
            info!("Persisting locks under {}", dir);
            Arc::new(FileLockStore::open(dir)?)
        }
        None => Arc::new(MemoryLockStore::new()),
    };

    let params = LockParams {
        ttl: chrono::Duration::hours(config.lock.ttl_hours),
        score_jump: config.lock.score_jump_threshold,
        top_n: config.leaderboard.per_ticker_top,
    };

    Ok(Scanner::new(provider, LockManager::new(store, params)))
}

fn provenance_label(provenance: DataProvenance) -> &'static str {
    match provenance {
        DataProvenance::Simulated => "simulated",
        DataProvenance::Live => "live",
    }
}

async fn run_single_scan(
    scanner: &Scanner,
    config: &BotConfig,
    symbol: &str,
    spot_override: Option<f64>,
    rng: &mut StdRng,
) -> Result<()> {
    let spot = spot_override.or_else(|| {
        config
            .universe
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .map(|t| t.reference_spot)
    });
    let Some(spot) = spot else {
        bail!("{} is not in the configured universe — pass --spot", symbol);
    };

    match scanner.run_scan(symbol, spot, rng).await? {
        ScanOutcome::Superseded => info!("{}: scan superseded", symbol),
        ScanOutcome::Completed(report) => {
            let snap = &report.snapshot;
            info!(
                "{}: spot={:.2} iv={:.1} ivp={:.1} hv={:.1} vix={:.1} rsi={:.1} ({} data)",
                symbol,
                snap.spot_price,
                snap.implied_volatility,
                snap.iv_percentile,
                snap.realized_volatility,
                snap.vix,
                snap.rsi,
                provenance_label(snap.provenance),
            );
            info!("{} admitted candidates:", report.candidates.len());
            for trade in report.candidates.iter().take(10) {
                info!(
                    "  {:<32} score={:<3} tier={:?} credit={:.2} maxloss={:.2} pop={:.0}%",
                    trade.candidate.id,
                    trade.breakdown.display_score,
                    trade.breakdown.tier,
                    trade.candidate.credit,
                    trade.candidate.max_loss,
                    trade.candidate.probability_of_profit,
                );
            }
            match report.locked {
                Some(lock) => info!(
                    "Locked top-{} ({}, valid until {})",
                    lock.trades.len(),
                    lock.reason,
                    lock.valid_until
                ),
                None => info!("No lock taken (no admissible candidates)"),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?;
    info!(
        "Loaded configuration: {} tickers, refresh every {}s",
        config.universe.len(),
        config.timing.refresh_interval_secs
    );

    let scanner = build_scanner(&config)?;
    let mut rng = StdRng::from_entropy();

    if let Some(symbol) = &cli.ticker {
        return run_single_scan(&scanner, &config, symbol, cli.spot, &mut rng).await;
    }

    loop {
        let board = build_leaderboard(
            &scanner,
            &config.universe,
            &mut rng,
            config.leaderboard.per_ticker_top,
            config.leaderboard.global_top,
        )
        .await;

        info!("Leaderboard ({} entries):", board.len());
        for (rank, entry) in board.iter().enumerate() {
            info!(
                "  #{:<2} {:<6} {:<32} score={:<3} tier={:?} credit={:.2} pop={:.0}%",
                rank + 1,
                entry.candidate.ticker,
                entry.candidate.id,
                entry.breakdown.display_score,
                entry.breakdown.tier,
                entry.candidate.credit,
                entry.candidate.probability_of_profit,
            );
        }

        if cli.once {
            return Ok(());
        }
        sleep(Duration::from_secs(config.timing.refresh_interval_secs)).await;
    }
}
