//! Market data providers.
//!
//! Defines the `MarketDataProvider` trait and the Yahoo Finance
//! implementation. The engine only ever talks to the trait, so tests can
//! substitute a deterministic in-memory provider.

pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{OptionContract, PriceSnapshot};

/// Abstraction over a spot-price and options-chain source.
///
/// All three calls are blocking from the engine's point of view and are
/// expected to be bounded by a client-side timeout; a timeout surfaces as
/// an error, which the scan unit treats the same as "no data".
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Most recent traded price for the ticker, or `None` when the
    /// provider has no data for it.
    async fn fetch_price(&self, ticker: &str) -> Result<Option<PriceSnapshot>>;

    /// Listed option expiration dates for the ticker. An empty list means
    /// the ticker has no listed options.
    async fn fetch_expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>>;

    /// Full call + put contract list for one expiration.
    async fn fetch_chain(&self, ticker: &str, expiration: NaiveDate)
        -> Result<Vec<OptionContract>>;
}
