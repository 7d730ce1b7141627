//! Remote listing errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the deployment, reservation and discovery listings.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ScanError {
    /// Caller lacks read permission on the scope
    #[error("Access denied on {scope}")]
    AccessDenied {
        /// Account, subscription or tenant scope that refused the read
        scope: String,
    },

    /// Account, workspace or resource group does not exist
    #[error("Not found: {resource}")]
    NotFound {
        /// Resource that could not be located
        resource: String,
    },

    /// Throttling, timeout or server-side failure
    #[error("Transient failure on {scope}: {message}")]
    Transient {
        /// Scope of the failed call
        scope: String,
        /// Details about the failure
        message: String,
    },

    /// Listing returned a body that could not be decoded
    #[error("Malformed response from {scope}: {message}")]
    MalformedResponse {
        /// Scope of the failed call
        scope: String,
        /// Decode failure details
        message: String,
    },
}

impl ScanError {
    /// Short, stable name of the error kind for logs and annotations.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AccessDenied { .. } => "access_denied",
            Self::NotFound { .. } => "not_found",
            Self::Transient { .. } => "transient",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }

    /// Check if this is a permission gap rather than a broken call.
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_access_denied() {
        let transient = ScanError::Transient { scope: "x".to_string(), message: "429".to_string() };
        let denied = ScanError::AccessDenied { scope: "x".to_string() };

        assert!(!transient.is_access_denied());
        assert!(denied.is_access_denied());
        assert_eq!(transient.kind(), "transient");
        assert_eq!(ScanError::NotFound { resource: "x".to_string() }.kind(), "not_found");
    }
}
