//! End-to-end scan cycle tests.
//!
//! Drives the orchestrator with a deterministic in-memory market data
//! provider and an in-memory sink — no network, no filesystem. Covers
//! fault isolation across tickers, emission ordering, partial-chain
//! semantics, and mid-cycle shutdown.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use optionscout::config::{ModelConfig, SelectorConfig};
use optionscout::engine::{ScanOrchestrator, StockScanner};
use optionscout::providers::MarketDataProvider;
use optionscout::sink::RecommendationSink;
use optionscout::strategy::{CandidateSelector, ProbabilityModel};
use optionscout::types::{OptionContract, OptionType, PriceSnapshot, Recommendation};

// ---------------------------------------------------------------------------
// Mock market data provider
// ---------------------------------------------------------------------------

/// Per-ticker scripted market data. Tickers without a script error on
/// every call, exercising the engine's fault isolation.
#[derive(Default)]
struct MockMarket {
    prices: HashMap<String, f64>,
    chains: HashMap<String, Vec<OptionContract>>,
    /// Tickers whose chain fetch fails for every expiration.
    chain_failures: Vec<String>,
    /// Tickers seen by fetch_price, in call order.
    price_calls: Mutex<Vec<String>>,
}

impl MockMarket {
    fn new() -> Self {
        Self::default()
    }

    /// Script a ticker with a spot price and one strong OTM call just
    /// above spot (σ high enough for a positive edge at a 0.5 target).
    fn with_good_ticker(mut self, ticker: &str, spot: f64) -> Self {
        self.prices.insert(ticker.to_string(), spot);
        self.chains.insert(
            ticker.to_string(),
            vec![make_call(ticker, spot + 1.0, 2.0, 1.5)],
        );
        self
    }

    fn with_price_only(mut self, ticker: &str, spot: f64) -> Self {
        self.prices.insert(ticker.to_string(), spot);
        self.chains.insert(ticker.to_string(), Vec::new());
        self
    }
}

fn make_call(ticker: &str, strike: f64, last_price: f64, iv: f64) -> OptionContract {
    OptionContract {
        contract_symbol: format!("{ticker}-C-{strike:.0}"),
        ticker: ticker.to_string(),
        option_type: OptionType::Call,
        strike,
        last_price,
        implied_volatility: Some(iv),
        expiration: expiry(),
    }
}

fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 18).unwrap()
}

#[async_trait]
impl MarketDataProvider for MockMarket {
    async fn fetch_price(&self, ticker: &str) -> Result<Option<PriceSnapshot>> {
        self.price_calls.lock().unwrap().push(ticker.to_string());
        match self.prices.get(ticker) {
            Some(p) => Ok(Some(PriceSnapshot::new(ticker, *p))),
            None => Err(anyhow!("price feed has no data for {ticker}")),
        }
    }

    async fn fetch_expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>> {
        if self.prices.contains_key(ticker) {
            Ok(vec![expiry()])
        } else {
            Err(anyhow!("no options for {ticker}"))
        }
    }

    async fn fetch_chain(
        &self,
        ticker: &str,
        _expiration: NaiveDate,
    ) -> Result<Vec<OptionContract>> {
        if self.chain_failures.iter().any(|t| t == ticker) {
            return Err(anyhow!("chain fetch failed for {ticker}"));
        }
        Ok(self.chains.get(ticker).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// In-memory sink
// ---------------------------------------------------------------------------

struct MemorySink {
    rows: Mutex<Vec<Recommendation>>,
}

impl MemorySink {
    fn new() -> Self {
        Self { rows: Mutex::new(Vec::new()) }
    }

    fn rows(&self) -> Vec<Recommendation> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecommendationSink for MemorySink {
    async fn reset(&self) -> Result<()> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }

    async fn append(&self, rec: &Recommendation) -> Result<()> {
        self.rows.lock().unwrap().push(rec.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn build_orchestrator(
    market: Arc<MockMarket>,
    sink: Arc<MemorySink>,
    universe: &[&str],
) -> ScanOrchestrator {
    let scanner = StockScanner::new(
        market,
        CandidateSelector::new(
            SelectorConfig::default(),
            ProbabilityModel::new(ModelConfig::default()),
        ),
    );
    ScanOrchestrator::new(
        scanner,
        sink,
        universe.iter().map(|s| s.to_string()).collect(),
        3,
    )
}

fn no_shutdown() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    drop(tx);
    rx
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_cycle_emits_one_row_per_good_ticker() {
    let market = Arc::new(
        MockMarket::new()
            .with_good_ticker("AAPL", 100.0)
            .with_good_ticker("NVDA", 200.0),
    );
    let sink = Arc::new(MemorySink::new());
    let mut orch = build_orchestrator(market, sink.clone(), &["AAPL", "NVDA"]);

    let report = orch.run_cycle(&no_shutdown()).await;

    assert_eq!(report.tickers_scanned, 2);
    assert_eq!(report.recommendations_emitted, 2);
    assert_eq!(report.skipped, 0);

    let rows = sink.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].ticker, "AAPL");
    assert_eq!(rows[0].contract_symbol, "AAPL-C-101");
    assert!(rows[0].option_label.starts_with("OTM"));
    assert!(rows[0].edge_percent > 0.0);
    assert_eq!(rows[1].ticker, "NVDA");
}

#[tokio::test]
async fn failing_ticker_is_isolated() {
    // "DEAD" has no scripted data at all: price fetch errors.
    let market = Arc::new(
        MockMarket::new()
            .with_good_ticker("AAPL", 100.0)
            .with_good_ticker("MSFT", 300.0),
    );
    let sink = Arc::new(MemorySink::new());
    let mut orch = build_orchestrator(market, sink.clone(), &["AAPL", "DEAD", "MSFT"]);

    let report = orch.run_cycle(&no_shutdown()).await;

    // The bad ticker contributes zero rows and does not halt the others.
    assert_eq!(report.tickers_scanned, 3);
    assert_eq!(report.recommendations_emitted, 2);
    assert_eq!(report.skipped, 1);

    let tickers: Vec<String> = sink.rows().iter().map(|r| r.ticker.clone()).collect();
    assert_eq!(tickers, vec!["AAPL", "MSFT"]);
}

#[tokio::test]
async fn tickers_processed_in_universe_order() {
    let market = Arc::new(
        MockMarket::new()
            .with_good_ticker("C", 10.0)
            .with_good_ticker("A", 10.0)
            .with_good_ticker("B", 10.0),
    );
    let sink = Arc::new(MemorySink::new());
    let mut orch = build_orchestrator(market.clone(), sink, &["C", "A", "B"]);

    orch.run_cycle(&no_shutdown()).await;

    let calls = market.price_calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["C", "A", "B"]);
}

#[tokio::test]
async fn empty_chain_ticker_is_skipped() {
    let market = Arc::new(
        MockMarket::new()
            .with_price_only("NOOPT", 50.0)
            .with_good_ticker("AAPL", 100.0),
    );
    let sink = Arc::new(MemorySink::new());
    let mut orch = build_orchestrator(market, sink.clone(), &["NOOPT", "AAPL"]);

    let report = orch.run_cycle(&no_shutdown()).await;

    assert_eq!(report.recommendations_emitted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(sink.rows()[0].ticker, "AAPL");
}

#[tokio::test]
async fn chain_failures_skip_without_halting() {
    let mut market = MockMarket::new().with_good_ticker("AAPL", 100.0);
    market.prices.insert("FLAKY".to_string(), 80.0);
    market.chain_failures.push("FLAKY".to_string());
    let market = Arc::new(market);
    let sink = Arc::new(MemorySink::new());
    let mut orch = build_orchestrator(market, sink.clone(), &["FLAKY", "AAPL"]);

    let report = orch.run_cycle(&no_shutdown()).await;

    assert_eq!(report.recommendations_emitted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(sink.rows().len(), 1);
}

#[tokio::test]
async fn cycles_are_independent() {
    let market = Arc::new(MockMarket::new().with_good_ticker("AAPL", 100.0));
    let sink = Arc::new(MemorySink::new());
    let mut orch = build_orchestrator(market, sink.clone(), &["AAPL"]);

    let shutdown = no_shutdown();
    let first = orch.run_cycle(&shutdown).await;
    let second = orch.run_cycle(&shutdown).await;

    assert_eq!(first.cycle_number, 1);
    assert_eq!(second.cycle_number, 2);
    // Same universe snapshot, fresh evaluation: one row per cycle.
    assert_eq!(sink.rows().len(), 2);
    assert_eq!(first.recommendations_emitted, 1);
    assert_eq!(second.recommendations_emitted, 1);
}

#[tokio::test]
async fn shutdown_mid_universe_stops_at_ticker_boundary() {
    let market = Arc::new(
        MockMarket::new()
            .with_good_ticker("AAPL", 100.0)
            .with_good_ticker("MSFT", 300.0),
    );
    let sink = Arc::new(MemorySink::new());
    let mut orch = build_orchestrator(market, sink.clone(), &["AAPL", "MSFT"]);

    // Signal already set: the cycle must not start any ticker.
    let (tx, rx) = watch::channel(true);
    let report = orch.run_cycle(&rx).await;
    drop(tx);

    assert_eq!(report.tickers_scanned, 0);
    assert!(sink.rows().is_empty());
}
