//! OPTIONSCOUT — Autonomous equity options edge scanner
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod providers;
pub mod universe;
pub mod strategy;
pub mod engine;
pub mod sink;
