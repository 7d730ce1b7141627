//! Inbound event rejections.
//!
//! Every variant means the event is skipped entirely and no report is produced.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons an inbound notification is not processed.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum EventError {
    /// A required field is absent or empty
    #[error("Missing field: {field}")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// Operation is not one of the recognized deployment writes
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Operation name carried by the event
        operation: String,
    },

    /// Operation did not succeed
    #[error("Operation status is {status}, expected Succeeded")]
    NotSucceeded {
        /// Status carried by the event
        status: String,
    },

    /// Resource id could not be parsed into subscription/group/account
    #[error("Invalid resource id {resource_id}: {message}")]
    InvalidResourceId {
        /// Raw resource id
        resource_id: String,
        /// What was missing
        message: String,
    },

    /// Payload is not valid JSON for the event schema
    #[error("Invalid event payload: {message}")]
    Json {
        /// Decoder error
        message: String,
    },
}

impl EventError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::UnsupportedOperation { .. } => "unsupported_operation",
            Self::NotSucceeded { .. } => "not_succeeded",
            Self::InvalidResourceId { .. } => "invalid_resource_id",
            Self::Json { .. } => "json",
        }
    }
}

impl From<serde_json::Error> for EventError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}
