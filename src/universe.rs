//! Ticker universe sources.
//!
//! The universe is fetched exactly once at process start and kept as an
//! ordered snapshot for every subsequent cycle. Two strategies:
//!
//! - `FileUniverse` — newline-delimited ticker list. A missing file is
//!   fatal at startup: with no universe there is nothing to scan.
//! - `Sp500Universe` — scrape of the slickcharts S&P 500 ranking table,
//!   taking the ticker column of the top-N rows. Failure here is
//!   non-fatal: the loop runs with zero work and a warning.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::UniverseConfig;
use crate::types::ScoutError;

const SP500_URL: &str = "https://www.slickcharts.com/sp500";

/// Column index of the ticker symbol in the slickcharts ranking table
/// (rank, company, symbol, ...).
const TICKER_COLUMN: usize = 2;

/// Source of the ordered ticker universe.
#[async_trait]
pub trait UniverseProvider: Send + Sync {
    async fn fetch(&self) -> Result<Vec<String>>;
}

/// Build the configured universe provider.
pub fn from_config(cfg: &UniverseConfig) -> Result<Box<dyn UniverseProvider>> {
    match cfg.source.as_str() {
        "file" => Ok(Box::new(FileUniverse::new(&cfg.file_path))),
        "sp500" => Ok(Box::new(Sp500Universe::new(cfg.top_n)?)),
        other => Err(ScoutError::Config(format!("Unknown universe source: {other}")).into()),
    }
}

// ---------------------------------------------------------------------------
// File-based universe
// ---------------------------------------------------------------------------

pub struct FileUniverse {
    path: PathBuf,
}

impl FileUniverse {
    pub fn new(path: &str) -> Self {
        Self { path: PathBuf::from(path) }
    }

    fn parse(contents: &str) -> Vec<String> {
        contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }
}

#[async_trait]
impl UniverseProvider for FileUniverse {
    async fn fetch(&self) -> Result<Vec<String>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            ScoutError::Universe(format!("Failed to read {}: {e}", self.path.display()))
        })?;

        let tickers = Self::parse(&contents);
        info!(count = tickers.len(), path = %self.path.display(), "Loaded ticker universe from file");
        Ok(tickers)
    }
}

// ---------------------------------------------------------------------------
// S&P 500 scrape
// ---------------------------------------------------------------------------

pub struct Sp500Universe {
    http: Client,
    top_n: usize,
}

impl Sp500Universe {
    pub fn new(top_n: usize) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| ScoutError::Universe(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, top_n })
    }

    /// Extract ticker symbols from the ranking table HTML: for each
    /// `<tr>` after the header, take the text of the third `<td>`.
    ///
    /// Deliberately narrow hand parsing — the page is a single flat
    /// table and the corpus carries no HTML parser.
    fn parse_table(html: &str, top_n: usize) -> Vec<String> {
        let mut tickers = Vec::new();

        for row in html.split("<tr").skip(2) {
            // skip pre-table prefix + header row
            let cells: Vec<&str> = row.split("<td").skip(1).map(Self::cell_text).collect();
            if let Some(text) = cells.get(TICKER_COLUMN) {
                if !text.is_empty() {
                    tickers.push(text.to_string());
                }
            }
            if tickers.len() >= top_n {
                break;
            }
        }

        tickers
    }

    /// Inner text of one `<td ...>...</td>` fragment, with nested tags
    /// (the symbol is wrapped in an anchor) stripped out.
    fn cell_text(fragment: &str) -> &str {
        let inner = fragment
            .split_once('>')
            .map(|(_, rest)| rest)
            .unwrap_or(fragment);
        let inner = inner.split("</td>").next().unwrap_or(inner);

        // Strip nested tags by taking the deepest text run.
        let mut text = inner;
        while let Some((before, after)) = text.split_once('<') {
            let before = before.trim();
            if !before.is_empty() {
                return before;
            }
            text = after.split_once('>').map(|(_, rest)| rest).unwrap_or("");
        }
        text.trim()
    }
}

#[async_trait]
impl UniverseProvider for Sp500Universe {
    async fn fetch(&self) -> Result<Vec<String>> {
        info!(top_n = self.top_n, "Fetching S&P 500 ranking...");

        let html = match self.fetch_page().await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "S&P 500 scrape failed, starting with empty universe");
                return Ok(Vec::new());
            }
        };

        let tickers = Self::parse_table(&html, self.top_n);
        if tickers.is_empty() {
            warn!("S&P 500 table yielded no tickers, starting with empty universe");
        } else {
            info!(count = tickers.len(), "Fetched S&P 500 universe");
        }
        Ok(tickers)
    }
}

impl Sp500Universe {
    async fn fetch_page(&self) -> Result<String> {
        let resp = self.http.get(SP500_URL).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("S&P 500 page returned {}", resp.status());
        }
        Ok(resp.text().await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
