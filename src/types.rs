//! Shared types for the OPTIONSCOUT agent.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that provider, strategy,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Option contracts
// ---------------------------------------------------------------------------

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

/// Whether a strike is currently favorable (ITM) or not (OTM) relative
/// to the spot price, given the option type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Moneyness {
    Itm,
    Otm,
}

impl fmt::Display for Moneyness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Moneyness::Itm => write!(f, "ITM"),
            Moneyness::Otm => write!(f, "OTM"),
        }
    }
}

/// A single listed option contract, as snapshotted from the chain provider.
/// Immutable once fetched; one chain is a set of these for a given ticker
/// and scan cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    /// Unique exchange symbol, e.g. "AAPL260918C00250000".
    pub contract_symbol: String,
    pub ticker: String,
    pub option_type: OptionType,
    pub strike: f64,
    /// Last traded premium. Non-negative.
    pub last_price: f64,
    /// Annualized implied volatility. Absent or NaN quotes fall back to
    /// the model's default volatility.
    pub implied_volatility: Option<f64>,
    pub expiration: NaiveDate,
}

impl OptionContract {
    /// Whether this contract is out-of-the-money at the given spot:
    /// calls with strike above spot, puts with strike below.
    pub fn is_otm_at(&self, spot: f64) -> bool {
        match self.option_type {
            OptionType::Call => self.strike > spot,
            OptionType::Put => self.strike < spot,
        }
    }

    /// Display moneyness at the given spot. The at-the-money case
    /// (strike == spot) labels as OTM, matching the recommendation
    /// output convention rather than exchange terminology.
    pub fn moneyness_at(&self, spot: f64) -> Moneyness {
        let itm = match self.option_type {
            OptionType::Call => self.strike < spot,
            OptionType::Put => self.strike > spot,
        };
        if itm {
            Moneyness::Itm
        } else {
            Moneyness::Otm
        }
    }

    /// Helper to build a test contract with sensible defaults.
    #[cfg(test)]
    pub fn sample(symbol: &str, option_type: OptionType, strike: f64, last_price: f64) -> Self {
        OptionContract {
            contract_symbol: symbol.to_string(),
            ticker: "TEST".to_string(),
            option_type,
            strike,
            last_price,
            implied_volatility: Some(0.2),
            expiration: NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
        }
    }
}

impl fmt::Display for OptionContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} K=${:.2} @ ${:.2} exp {}",
            self.ticker,
            self.option_type,
            self.contract_symbol,
            self.strike,
            self.last_price,
            self.expiration,
        )
    }
}

// ---------------------------------------------------------------------------
// Price snapshot
// ---------------------------------------------------------------------------

/// The most recent traded price for a ticker. Created fresh each scan,
/// never mutated, discarded after use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub ticker: String,
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn new(ticker: &str, price: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            price,
            observed_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// The single best-edge contract chosen for a ticker in one scan cycle.
/// Appended to the sink and then forgotten — the engine holds no further
/// reference to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub current_price: f64,
    /// Display label, e.g. "OTM CALL".
    pub option_label: String,
    pub contract_symbol: String,
    pub strike: f64,
    /// The contract's last traded price.
    pub premium: f64,
    pub expiration: NaiveDate,
    pub edge_percent: f64,
    pub timestamp: DateTime<Utc>,
}

impl Recommendation {
    /// Flatten into a sink row. Column order matches the fixed header
    /// written at startup.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.ticker.clone(),
            format!("{:.2}", self.current_price),
            self.option_label.clone(),
            self.contract_symbol.clone(),
            format!("{:.2}", self.strike),
            format!("{:.2}", self.premium),
            self.expiration.to_string(),
            format!("{:.2}", self.edge_percent),
            self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} K=${:.2} premium=${:.2} edge={:.2}% exp {}",
            self.ticker,
            self.option_label,
            self.contract_symbol,
            self.strike,
            self.premium,
            self.edge_percent,
            self.expiration,
        )
    }
}

// ---------------------------------------------------------------------------
// Scan outcomes
// ---------------------------------------------------------------------------

/// Why a ticker produced no recommendation this cycle. Each variant is a
/// recovered, observable failure — none of them aborts the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// No price snapshot could be fetched.
    PriceUnavailable,
    /// The provider listed no expiration dates.
    NoExpirations,
    /// Every per-expiration chain fetch failed or returned nothing.
    EmptyChain,
    /// Contracts were fetched but none survived the selector's filters.
    NoCandidate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::PriceUnavailable => write!(f, "price unavailable"),
            SkipReason::NoExpirations => write!(f, "no expirations listed"),
            SkipReason::EmptyChain => write!(f, "empty option chain"),
            SkipReason::NoCandidate => write!(f, "no candidate survived filters"),
        }
    }
}

/// Result of scanning one ticker. Never an error: all per-ticker failures
/// are downgraded to a typed skip so the cycle keeps running.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Recommended(Recommendation),
    Skipped(SkipReason),
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Summary of a single scan cycle over the whole universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub started_at: DateTime<Utc>,
    pub tickers_scanned: usize,
    pub recommendations_emitted: usize,
    pub skipped: usize,
    /// Rows lost to sink failures after retries were exhausted.
    pub sink_failures: usize,
    pub duration_secs: f64,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle #{}: scanned={} emitted={} skipped={} sink_failures={} took={:.1}s",
            self.cycle_number,
            self.tickers_scanned,
            self.recommendations_emitted,
            self.skipped,
            self.sink_failures,
            self.duration_secs,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for OPTIONSCOUT.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("Universe error: {0}")]
    Universe(String),

    #[error("Market data error ({ticker}): {message}")]
    MarketData { ticker: String, message: String },

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
