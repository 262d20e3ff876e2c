//! OPTIONSCOUT — Autonomous equity options edge scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! snapshots the ticker universe, resets the sink, and runs the
//! scan→score→recommend loop with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use optionscout::config;
use optionscout::engine::{ScanOrchestrator, StockScanner};
use optionscout::providers::yahoo::YahooFinanceClient;
use optionscout::sink::{CsvSink, RecommendationSink};
use optionscout::strategy::{CandidateSelector, ProbabilityModel};
use optionscout::types::CycleReport;
use optionscout::universe;

const BANNER: &str = r#"
 ____   ____ ___  _   _ _____
/ ___| / ___/ _ \| | | |_   _|
\___ \| |  | | | | | | | | |
 ___) | |__| |_| | |_| | | |
|____/ \____\___/ \___/  |_|

  OPTIONSCOUT — Options Edge Scanner
  v0.1.0 — Unattended Agent
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        scan_interval_secs = cfg.agent.scan_interval_secs,
        universe_source = %cfg.universe.source,
        "OPTIONSCOUT starting up"
    );

    // -- Universe snapshot (taken once, never re-fetched) -----------------

    let universe_provider = universe::from_config(&cfg.universe)?;
    let tickers = universe_provider.fetch().await?;
    if tickers.is_empty() {
        warn!("Universe is empty — cycles will run with zero work");
    } else {
        info!(count = tickers.len(), "Universe snapshot taken");
    }

    // -- Initialise components -------------------------------------------

    let provider = Arc::new(YahooFinanceClient::new()?);

    let selector = CandidateSelector::new(
        cfg.selector.clone(),
        ProbabilityModel::new(cfg.model.clone()),
    );

    let sink: Arc<dyn RecommendationSink> = Arc::new(CsvSink::new(&cfg.sink.csv_path));
    sink.reset().await?;

    let scanner = StockScanner::new(provider, selector);
    let mut orchestrator =
        ScanOrchestrator::new(scanner, sink, tickers, cfg.sink.append_retries);

    // -- Shutdown signal --------------------------------------------------

    // The watch channel lets the orchestrator stop at the next safe point
    // (completion of the current ticker) instead of waiting a full cycle.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received.");
            let _ = shutdown_tx.send(true);
        }
    });

    // -- Main loop --------------------------------------------------------

    info!(
        delay_secs = cfg.agent.scan_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    // The delay starts after the scan finishes, so the full period is
    // scan duration + delay rather than a fixed wall-clock interval.
    let delay = Duration::from_secs(cfg.agent.scan_interval_secs);
    let mut shutdown_watch = shutdown_rx.clone();
    loop {
        let report = orchestrator.run_cycle(&shutdown_rx).await;
        log_cycle_report(&report);
        if *shutdown_rx.borrow() {
            break;
        }
        info!(
            delay_secs = cfg.agent.scan_interval_secs,
            "Cycle complete, waiting before the next scan"
        );
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_watch.changed() => {
                break;
            }
        }
    }

    info!("OPTIONSCOUT shut down cleanly.");
    Ok(())
}

/// Log a human-readable cycle summary.
fn log_cycle_report(report: &CycleReport) {
    info!(
        cycle = report.cycle_number,
        scanned = report.tickers_scanned,
        emitted = report.recommendations_emitted,
        skipped = report.skipped,
        sink_failures = report.sink_failures,
        took = format!("{:.1}s", report.duration_secs),
        "Cycle complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("optionscout=info"));

    let json_logging = std::env::var("OPTIONSCOUT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
