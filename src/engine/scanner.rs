//! Per-ticker scan unit.
//!
//! Composes one ticker's price snapshot and merged option chain into a
//! single recommendation outcome. Every failure is isolated to the
//! ticker: the unit never returns an error, only a typed skip reason.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::providers::MarketDataProvider;
use crate::strategy::CandidateSelector;
use crate::types::{OptionContract, Recommendation, ScanOutcome, SkipReason};

pub struct StockScanner {
    provider: Arc<dyn MarketDataProvider>,
    selector: CandidateSelector,
}

impl StockScanner {
    pub fn new(provider: Arc<dyn MarketDataProvider>, selector: CandidateSelector) -> Self {
        Self { provider, selector }
    }

    /// Scan one ticker: price → expirations → chains → selection.
    ///
    /// Partial-success semantics on the chain fetches: one bad expiration
    /// is skipped with a warning and does not void the others.
    pub async fn scan_one(&self, ticker: &str) -> ScanOutcome {
        let snapshot = match self.provider.fetch_price(ticker).await {
            Ok(Some(s)) => s,
            Ok(None) => {
                info!(ticker, "No price data, skipping");
                return ScanOutcome::Skipped(SkipReason::PriceUnavailable);
            }
            Err(e) => {
                warn!(ticker, error = %e, "Price fetch failed, skipping");
                return ScanOutcome::Skipped(SkipReason::PriceUnavailable);
            }
        };
        debug!(ticker, price = format!("${:.2}", snapshot.price), "Price fetched");

        let expirations = match self.provider.fetch_expirations(ticker).await {
            Ok(dates) if !dates.is_empty() => dates,
            Ok(_) => {
                info!(ticker, "No listed expirations, skipping");
                return ScanOutcome::Skipped(SkipReason::NoExpirations);
            }
            Err(e) => {
                warn!(ticker, error = %e, "Expiration fetch failed, skipping");
                return ScanOutcome::Skipped(SkipReason::NoExpirations);
            }
        };

        let mut chain: Vec<OptionContract> = Vec::new();
        for expiration in &expirations {
            match self.provider.fetch_chain(ticker, *expiration).await {
                Ok(contracts) => chain.extend(contracts),
                Err(e) => {
                    warn!(
                        ticker,
                        expiration = %expiration,
                        error = %e,
                        "Chain fetch failed for this expiration, continuing with the rest"
                    );
                }
            }
        }

        if chain.is_empty() {
            info!(ticker, "No option contracts could be fetched, skipping");
            return ScanOutcome::Skipped(SkipReason::EmptyChain);
        }
        debug!(
            ticker,
            contracts = chain.len(),
            expirations = expirations.len(),
            "Option chain merged"
        );

        match self.selector.select_best(&chain, snapshot.price) {
            Some(candidate) => {
                let rec = Recommendation {
                    ticker: ticker.to_string(),
                    current_price: snapshot.price,
                    option_label: candidate.option_label(snapshot.price),
                    contract_symbol: candidate.contract.contract_symbol.clone(),
                    strike: candidate.contract.strike,
                    premium: candidate.contract.last_price,
                    expiration: candidate.contract.expiration,
                    edge_percent: candidate.edge_percent,
                    timestamp: Utc::now(),
                };
                info!(
                    ticker,
                    contract = %rec.contract_symbol,
                    label = %rec.option_label,
                    strike = format!("${:.2}", rec.strike),
                    premium = format!("${:.2}", rec.premium),
                    edge = format!("{:.2}%", rec.edge_percent),
                    "Recommendation found"
                );
                ScanOutcome::Recommended(rec)
            }
            None => {
                info!(ticker, "No contract with positive edge");
                ScanOutcome::Skipped(SkipReason::NoCandidate)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
