//! logsift: access log ingestion and reporting
//!
//! Reads a web-server access log, extracts fields with a configured
//! pattern, normalizes them into typed rows and writes aggregate reports.
//!
//! ```text
//! pattern ──► source ──► pipeline ──► report
//! ```

pub mod cli;
pub mod config;
pub mod pattern;
pub mod pipeline;
pub mod report;
pub mod source;
