//! Reconciliation pipeline: intake, scanning, reservations, comparison, reporting.

pub mod comparator;
pub mod config;
pub mod engine;
pub mod intake;
pub mod logger;
pub mod reporter;
pub mod reservations;
pub mod scanner;
