//! PARLAY — betting-decision engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! assembles the configured slate from the fixture feeds, runs the
//! predict→build→size pipeline and prints the report as JSON.

use anyhow::{Context, Result};
use tracing::{info, warn};

use parlay_engine::config::AppConfig;
use parlay_engine::data::fixtures::FixtureSource;
use parlay_engine::data::load_slate;
use parlay_engine::strategy::BettingPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = AppConfig::path_from_env();
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    info!(
        config = %config_path,
        data_dir = %cfg.slate.data_dir,
        season = cfg.slate.season,
        week = cfg.slate.week,
        bankroll = cfg.sizing.bankroll,
        trials = cfg.simulation.trials,
        seeded = cfg.simulation.seed.is_some(),
        "PARLAY starting up"
    );

    let source = FixtureSource::new(&cfg.slate.data_dir);
    let slate = load_slate(
        &source,
        cfg.slate.season,
        cfg.slate.week,
        &cfg.slate.selected_games,
    )
    .await;

    if slate.games.is_empty() {
        warn!("Empty slate; the parlay will contain placeholder legs only");
    }

    let mut pipeline = BettingPipeline::from_config(&cfg);
    let report = pipeline
        .run(slate, cfg.sizing.bankroll)
        .context("Pipeline failed")?;

    for game in &report.games {
        info!(game = %game, "Prediction");
    }
    for movement in &report.line_movements {
        info!(movement = %movement, "Line moved");
    }
    info!(parlay = %report.parlay, "Parlay");
    info!(stake = %report.stake, "Stake");

    let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
    println!("{json}");

    Ok(())
}

/// Initialise the `tracing` subscriber. Logs go to stderr so stdout stays
/// clean JSON.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parlay_engine=info"));

    let json_logging = std::env::var("PARLAY_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
