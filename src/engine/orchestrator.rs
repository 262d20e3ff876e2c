//! Scan cycle orchestrator.
//!
//! Drives the scan unit over the full universe snapshot, strictly
//! sequentially and in fixed order. Each recommendation is emitted to
//! the sink immediately, not batched. No ticker's failure affects any
//! other ticker; sink failures are retried with backoff and, on
//! exhaustion, logged and dropped rather than crashing the loop.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::engine::scanner::StockScanner;
use crate::sink::RecommendationSink;
use crate::types::{CycleReport, Recommendation, ScanOutcome};

/// First retry delay after a failed sink append; doubles per attempt.
const SINK_BACKOFF_BASE_MS: u64 = 500;

pub struct ScanOrchestrator {
    scanner: StockScanner,
    sink: Arc<dyn RecommendationSink>,
    universe: Vec<String>,
    append_retries: u32,
    cycle_count: u64,
}

impl ScanOrchestrator {
    pub fn new(
        scanner: StockScanner,
        sink: Arc<dyn RecommendationSink>,
        universe: Vec<String>,
        append_retries: u32,
    ) -> Self {
        Self {
            scanner,
            sink,
            universe,
            append_retries,
            cycle_count: 0,
        }
    }

    /// Number of tickers in the startup universe snapshot.
    pub fn universe_size(&self) -> usize {
        self.universe.len()
    }

    /// Run one full pass over the universe.
    ///
    /// `shutdown` is checked between tickers: once it flips, the cycle
    /// stops issuing further work at the next safe point (completion of
    /// the current ticker) and returns a partial report.
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> CycleReport {
        self.cycle_count += 1;
        let started_at = Utc::now();
        let start = std::time::Instant::now();
        let total = self.universe.len();

        info!(cycle = self.cycle_count, universe = total, "Starting scan cycle");

        let mut report = CycleReport {
            cycle_number: self.cycle_count,
            started_at,
            tickers_scanned: 0,
            recommendations_emitted: 0,
            skipped: 0,
            sink_failures: 0,
            duration_secs: 0.0,
        };

        for (idx, ticker) in self.universe.iter().enumerate() {
            if *shutdown.borrow() {
                info!(
                    cycle = self.cycle_count,
                    completed = idx,
                    total,
                    "Shutdown requested, stopping cycle early"
                );
                break;
            }

            info!(ticker = %ticker, position = idx + 1, total, "Analyzing");
            report.tickers_scanned += 1;

            match self.scanner.scan_one(ticker).await {
                ScanOutcome::Recommended(rec) => {
                    if self.emit(&rec).await {
                        report.recommendations_emitted += 1;
                    } else {
                        report.sink_failures += 1;
                    }
                }
                ScanOutcome::Skipped(reason) => {
                    info!(ticker = %ticker, reason = %reason, "No recommendation");
                    report.skipped += 1;
                }
            }
        }

        report.duration_secs = start.elapsed().as_secs_f64();
        report
    }

    /// Append one row to the sink, retrying with doubling backoff. On
    /// exhaustion the row is dropped and the cycle continues.
    async fn emit(&self, rec: &Recommendation) -> bool {
        let mut backoff = Duration::from_millis(SINK_BACKOFF_BASE_MS);

        for attempt in 1..=self.append_retries.max(1) {
            match self.sink.append(rec).await {
                Ok(()) => return true,
                Err(e) if attempt < self.append_retries.max(1) => {
                    warn!(
                        ticker = %rec.ticker,
                        attempt,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Sink append failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    error!(
                        ticker = %rec.ticker,
                        attempts = attempt,
                        error = %e,
                        "Sink append failed after retries, dropping row"
                    );
                }
            }
        }

        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
