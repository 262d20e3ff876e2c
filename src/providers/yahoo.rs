//! Yahoo Finance market data integration.
//!
//! Spot prices come from the v8 chart API at 1-minute bars (last close of
//! the most recent bar). Expirations and contract chains come from the v7
//! options API. No authentication is required for either endpoint.
//!
//! Chart base: https://query1.finance.yahoo.com/v8/finance/chart/
//! Options base: https://query2.finance.yahoo.com/v7/finance/options/

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::MarketDataProvider;
use crate::types::{OptionContract, OptionType, PriceSnapshot};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const OPTIONS_BASE_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";

/// Per-request timeout. A hung fetch must not stall the scan cycle; the
/// resulting error is treated upstream as "no data for this ticker".
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// API response types (Yahoo JSON → Rust)
// ---------------------------------------------------------------------------

/// `/v8/finance/chart/{ticker}` — we only deserialize the fields we need.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize, Default)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize, Default)]
struct QuoteBlock {
    /// Close per bar; bars without a trade are null.
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// `/v7/finance/options/{ticker}` envelope.
#[derive(Debug, Deserialize)]
struct OptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionsEnvelope,
}

#[derive(Debug, Deserialize)]
struct OptionsEnvelope {
    #[serde(default)]
    result: Vec<OptionsResult>,
}

#[derive(Debug, Deserialize)]
struct OptionsResult {
    /// All listed expirations, epoch seconds at midnight UTC.
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    /// Contract lists for the requested expiration.
    #[serde(default)]
    options: Vec<OptionPeriod>,
}

#[derive(Debug, Deserialize)]
struct OptionPeriod {
    #[serde(rename = "expirationDate", default)]
    expiration_date: i64,
    #[serde(default)]
    calls: Vec<YahooContract>,
    #[serde(default)]
    puts: Vec<YahooContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooContract {
    contract_symbol: String,
    strike: f64,
    #[serde(default)]
    last_price: f64,
    /// Absent on stale quotes.
    #[serde(default)]
    implied_volatility: Option<f64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Yahoo Finance client implementing `MarketDataProvider`.
pub struct YahooFinanceClient {
    http: Client,
}

impl YahooFinanceClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("OPTIONSCOUT/0.1.0 (options-edge-scanner)")
            .build()
            .context("Failed to build HTTP client for Yahoo Finance")?;

        Ok(Self { http })
    }

    // -- Internal helpers ------------------------------------------------

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "Fetching from Yahoo Finance");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("Yahoo Finance request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Yahoo Finance API error {status}: {body}");
        }

        resp.json::<T>()
            .await
            .context("Failed to parse Yahoo Finance response")
    }

    /// Convert an epoch-seconds expiration to a calendar date (UTC).
    fn epoch_to_date(epoch: i64) -> Option<NaiveDate> {
        DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
    }

    /// Convert a calendar date back to the midnight-UTC epoch the options
    /// API expects as its `date` parameter.
    fn date_to_epoch(date: NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0)
    }

    /// Last non-null 1-minute close from a chart response.
    fn last_close(resp: &ChartResponse) -> Option<f64> {
        let result = resp.chart.result.as_ref()?.first()?;
        let quote = result.indicators.quote.first()?;
        quote
            .close
            .iter()
            .rev()
            .filter_map(|c| *c)
            .find(|p| p.is_finite() && *p > 0.0)
    }

    /// Flatten one expiration period into domain contracts.
    fn to_contracts(ticker: &str, period: &OptionPeriod) -> Vec<OptionContract> {
        let expiration = Self::epoch_to_date(period.expiration_date)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());

        let convert = |c: &YahooContract, option_type: OptionType| OptionContract {
            contract_symbol: c.contract_symbol.clone(),
            ticker: ticker.to_string(),
            option_type,
            strike: c.strike,
            last_price: c.last_price,
            implied_volatility: c.implied_volatility,
            expiration,
        };

        let mut contracts: Vec<OptionContract> = period
            .calls
            .iter()
            .map(|c| convert(c, OptionType::Call))
            .collect();
        contracts.extend(period.puts.iter().map(|p| convert(p, OptionType::Put)));
        contracts
    }
}

// ---------------------------------------------------------------------------
// MarketDataProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fetch_price(&self, ticker: &str) -> Result<Option<PriceSnapshot>> {
        let url = format!("{CHART_BASE_URL}/{ticker}?range=1d&interval=1m");
        let resp: ChartResponse = self.get_json(&url).await?;

        match Self::last_close(&resp) {
            Some(price) => Ok(Some(PriceSnapshot::new(ticker, price))),
            None => {
                warn!(ticker, "Chart response contained no usable close");
                Ok(None)
            }
        }
    }

    async fn fetch_expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>> {
        let url = format!("{OPTIONS_BASE_URL}/{ticker}");
        let resp: OptionsResponse = self.get_json(&url).await?;

        let dates = resp
            .option_chain
            .result
            .first()
            .map(|r| {
                r.expiration_dates
                    .iter()
                    .filter_map(|e| Self::epoch_to_date(*e))
                    .collect()
            })
            .unwrap_or_default();

        Ok(dates)
    }

    async fn fetch_chain(
        &self,
        ticker: &str,
        expiration: NaiveDate,
    ) -> Result<Vec<OptionContract>> {
        let epoch = Self::date_to_epoch(expiration);
        let url = format!("{OPTIONS_BASE_URL}/{ticker}?date={epoch}");
        let resp: OptionsResponse = self.get_json(&url).await?;

        let contracts = resp
            .option_chain
            .result
            .first()
            .map(|r| {
                r.options
                    .iter()
                    .flat_map(|period| Self::to_contracts(ticker, period))
                    .collect()
            })
            .unwrap_or_default();

        Ok(contracts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
