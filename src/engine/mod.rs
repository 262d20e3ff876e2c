//! Core engine — the per-ticker scan unit and the cycle orchestrator.

pub mod orchestrator;
pub mod scanner;

pub use orchestrator::ScanOrchestrator;
pub use scanner::StockScanner;
