//! Recommendation sink.
//!
//! Append-only target for emitted recommendations. The sink is cleared
//! and given a fixed header row once at process start; afterwards it only
//! receives appends, one row per recommendation, serially.

use anyhow::Result;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::types::{Recommendation, ScoutError};

/// Column headers, matching `Recommendation::to_row` order.
pub const HEADER: [&str; 9] = [
    "Ticker",
    "Current Price",
    "Recommended Option Type",
    "Recommended Option",
    "Strike",
    "Premium",
    "Expiry",
    "Market Edge",
    "Timestamp",
];

/// Append-only destination for recommendation rows.
#[async_trait]
pub trait RecommendationSink: Send + Sync {
    /// Clear the sink and write the fixed header row. Called once at
    /// process start.
    async fn reset(&self) -> Result<()>;

    /// Append one recommendation row.
    async fn append(&self, rec: &Recommendation) -> Result<()>;
}

// ---------------------------------------------------------------------------
// CSV file sink
// ---------------------------------------------------------------------------

/// Writes recommendations to a local CSV file.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: &str) -> Self {
        Self { path: PathBuf::from(path) }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn write_record(&self, fields: &[String], truncate: bool) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(truncate)
            .append(!truncate)
            .open(&self.path)
            .map_err(|e| ScoutError::Sink(format!("open {}: {e}", self.path.display())))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(fields)
            .map_err(|e| ScoutError::Sink(format!("write {}: {e}", self.path.display())))?;
        writer
            .flush()
            .map_err(|e| ScoutError::Sink(format!("flush {}: {e}", self.path.display())))?;
        Ok(())
    }
}

#[async_trait]
impl RecommendationSink for CsvSink {
    async fn reset(&self) -> Result<()> {
        let header: Vec<String> = HEADER.iter().map(|s| s.to_string()).collect();
        self.write_record(&header, true)?;
        info!(path = %self.path.display(), "Sink cleared and header written");
        Ok(())
    }

    async fn append(&self, rec: &Recommendation) -> Result<()> {
        self.write_record(&rec.to_row(), false)?;
        debug!(ticker = %rec.ticker, contract = %rec.contract_symbol, "Row appended to sink");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
