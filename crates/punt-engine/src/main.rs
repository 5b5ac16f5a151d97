//! Punt engine demo session.
//!
//! Seeds a match and a poll, runs a burst of concurrent trades and
//! boost stakes against them, then resolves both and prints the
//! settlement outcome. Useful for smoke-testing the engine without any
//! HTTP surface in front of it.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal_macros::dec;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use punt_common::Outcome;
use punt_engine::{EngineConfig, MarketEngine, SellAmount};

/// CLI arguments for the demo session.
#[derive(Parser, Debug)]
#[command(name = "punt-engine")]
#[command(about = "Prediction-game market engine demo session")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/engine.toml")]
    config: PathBuf,

    /// Number of concurrent traders to simulate
    #[arg(short, long, default_value_t = 8)]
    traders: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        EngineConfig::from_file(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?
    } else {
        EngineConfig::default()
    };
    config.apply_env_overrides();

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global tracing subscriber")?;

    info!("Starting punt engine demo session");

    let engine = Arc::new(MarketEngine::new(config));

    let the_match = engine.create_match(
        "Brazil",
        "Argentina",
        &[
            (Outcome::TeamA, dec!(10)),
            (Outcome::TeamB, dec!(10)),
            (Outcome::Draw, dec!(10)),
        ],
    )?;
    let poll = engine.create_poll(
        "Will the final go to penalties?",
        &[(Outcome::Yes, dec!(5)), (Outcome::No, dec!(5))],
    )?;
    info!(%the_match, %poll, "seeded demo markets");

    // Concurrent traders hammering the same two items.
    let mut handles = Vec::new();
    for i in 0..args.traders {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let user = engine.register_user();
            let match_outcome = ["teamA", "teamB", "draw"][i % 3];
            let poll_outcome = if i % 2 == 0 { "yes" } else { "no" };

            engine.buy(&the_match, &user, match_outcome, dec!(2))?;
            engine.buy(&poll, &user, poll_outcome, dec!(1.5))?;
            engine.place_boost(&user, &the_match, match_outcome, dec!(3))?;
            engine.consume_free_ticket(&user, &poll, poll_outcome)?;

            if i % 4 == 0 {
                // Take some profit back out of the poll market.
                engine.sell(&poll, &user, SellAmount::Exact(dec!(0.1)))?;
            }
            punt_engine::Result::Ok(user)
        }));
    }

    for handle in handles {
        match handle.await.context("trader task panicked")? {
            Ok(user) => info!(%user, "trader finished"),
            Err(e) => warn!(error = %e, "trader rejected"),
        }
    }

    for (label, outcome) in [("teamA", "teamA"), ("teamB", "teamB"), ("draw", "draw")] {
        info!(
            outcome = label,
            price = %engine.price(&the_match, outcome)?,
            "match price"
        );
    }

    let match_receipt = engine.resolve(&the_match, "Brazil")?;
    info!(
        result = %match_receipt.summary.result,
        predictions = match_receipt.summary.predictions_settled,
        boost_paid = %match_receipt.summary.boost.total_paid,
        "match resolved"
    );

    let poll_receipt = engine.resolve(&poll, "YES")?;
    info!(
        result = %poll_receipt.summary.result,
        predictions = poll_receipt.summary.predictions_settled,
        market_winners = poll_receipt.summary.market_winners,
        "poll resolved"
    );

    let metrics = engine.metrics().snapshot();
    info!(
        buys = metrics.buys_executed,
        sells = metrics.sells_executed,
        rejected = metrics.trades_rejected,
        resolved = metrics.items_resolved,
        "session complete"
    );

    Ok(())
}
