//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every tunable that used to be a hard-coded constant in the prototype
//! (risk-free rate, time to expiry, premium ceiling, target probability,
//! scan interval) lives here so scenarios can override it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Fixed idle delay between scan cycles. Total period is
    /// scan duration + this delay, not a fixed wall-clock period.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
}

/// Where the ticker universe comes from. Fetched once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct UniverseConfig {
    /// "file" reads a newline-delimited ticker list;
    /// "sp500" scrapes the slickcharts S&P 500 ranking table.
    #[serde(default = "default_universe_source")]
    pub source: String,
    #[serde(default = "default_universe_file")]
    pub file_path: String,
    /// Rows to take from the top of the scraped ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            source: default_universe_source(),
            file_path: default_universe_file(),
            top_n: default_top_n(),
        }
    }
}

/// Probability model inputs. `time_to_expiry_days` is applied to every
/// contract regardless of its listed expiration.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    #[serde(default = "default_time_to_expiry_days")]
    pub time_to_expiry_days: f64,
    #[serde(default = "default_volatility")]
    pub default_volatility: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            time_to_expiry_days: default_time_to_expiry_days(),
            default_volatility: default_volatility(),
        }
    }
}

impl ModelConfig {
    /// Time to expiry in years, as used by the Black-Scholes d1 term.
    pub fn time_to_expiry_years(&self) -> f64 {
        self.time_to_expiry_days / 365.0
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelectorConfig {
    /// Contracts with a last price above this are discarded as
    /// illiquid/mispriced quotes.
    #[serde(default = "default_premium_ceiling")]
    pub premium_ceiling: f64,
    /// Baseline ITM probability the edge is measured against.
    #[serde(default = "default_target_probability")]
    pub target_probability: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            premium_ceiling: default_premium_ceiling(),
            target_probability: default_target_probability(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SinkConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    /// Append attempts before a row is dropped (with doubling backoff).
    #[serde(default = "default_append_retries")]
    pub append_retries: u32,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            append_retries: default_append_retries(),
        }
    }
}

// -- serde defaults --------------------------------------------------------

fn default_scan_interval_secs() -> u64 {
    600
}
fn default_universe_source() -> String {
    "file".to_string()
}
fn default_universe_file() -> String {
    "stocks.txt".to_string()
}
fn default_top_n() -> usize {
    100
}
fn default_risk_free_rate() -> f64 {
    0.01
}
fn default_time_to_expiry_days() -> f64 {
    14.0
}
fn default_volatility() -> f64 {
    0.2
}
fn default_premium_ceiling() -> f64 {
    250.0
}
fn default_target_probability() -> f64 {
    0.5
}
fn default_csv_path() -> String {
    "recommendations.csv".to_string()
}
fn default_append_retries() -> u32 {
    3
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }
}
