//! phone-lookup: multi-source phone number compliance lookup.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod retry;
pub mod sources;
pub mod engine;
pub mod report;
pub mod dashboard;
