//! Unified error types for PTU Sentinel Core.

use ptu_sentinel_types::{EventError, ScanError};
use serde::Serialize;
use thiserror::Error;

/// Main error type for all engine operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Inbound event was malformed or outside the allow-list; no report is produced.
    #[error("Malformed event: {0}")]
    MalformedEvent(#[from] EventError),

    /// Deployment or discovery listing failed and could not be degraded.
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Credential acquisition failed.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Short, stable name of the error kind for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedEvent(_) => "malformed_event",
            Self::Scan(e) => e.kind(),
            Self::Network(_) => "network",
            Self::Credential(_) => "credential",
            Self::Config(_) => "config",
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for engine operations.
pub type AppResult<T> = Result<T, AppError>;
