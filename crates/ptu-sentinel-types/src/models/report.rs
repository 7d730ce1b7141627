//! Reconciliation report models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeploymentRecord, ReservationRecord};

/// Outcome of comparing provisioned capacity against reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoverageStatus {
    /// Nothing reserved; every provisioned unit is billed hourly
    NoReservations,
    /// Reservations exceed deployed capacity
    UnderUtilized { surplus: u64 },
    /// Deployed capacity matches reservations exactly
    FullyCovered,
    /// Deployed capacity exceeds reservations
    OverAllocated { deficit: u64 },
}

impl CoverageStatus {
    pub fn surplus(self) -> u64 {
        match self {
            Self::UnderUtilized { surplus } => surplus,
            _ => 0,
        }
    }

    pub fn deficit(self) -> u64 {
        match self {
            Self::OverAllocated { deficit } => deficit,
            _ => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoReservations => "NoReservations",
            Self::UnderUtilized { .. } => "UnderUtilized",
            Self::FullyCovered => "FullyCovered",
            Self::OverAllocated { .. } => "OverAllocated",
        }
    }
}

impl std::fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Note attached to a report that completed in a degraded or partial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// Reservation read was denied; reserved capacity treated as zero
    ReservationsUnavailable,
    /// Reservation read failed for another reason
    ReservationQueryFailed { message: String },
    /// Reservation read did not finish before the pass deadline
    ReservationsTimedOut,
    /// One account's deployments could not be read
    AccountSkipped { account: String, kind: String, message: String },
    /// Deadline elapsed before these accounts finished scanning
    Partial { omitted: Vec<String> },
    /// Account discovery failed; only the triggering account was scanned
    AccountDiscoveryFailed { kind: String, message: String },
    /// Account discovery did not finish before the pass deadline
    AccountDiscoveryTimedOut,
}

impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReservationsUnavailable => f.write_str("reservations unavailable"),
            Self::ReservationQueryFailed { message } => {
                write!(f, "reservation query failed: {}", message)
            },
            Self::ReservationsTimedOut => f.write_str("reservation query timed out"),
            Self::AccountSkipped { account, kind, message } => {
                write!(f, "account {} skipped ({}): {}", account, kind, message)
            },
            Self::Partial { omitted } => {
                write!(f, "partial report, not scanned: {}", omitted.join(", "))
            },
            Self::AccountDiscoveryFailed { kind, message } => write!(
                f,
                "account discovery failed ({}), scanned triggering account only: {}",
                kind, message
            ),
            Self::AccountDiscoveryTimedOut => {
                f.write_str("account discovery timed out, scanned triggering account only")
            },
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Id of the event that triggered the pass
    pub event_id: Option<String>,
    /// Deployment named by the triggering event
    pub triggering_deployment: Option<String>,
    /// Provisioned capacity of the triggering deployment (0 when PAYG or absent)
    pub triggering_capacity: u64,
    /// Accounts whose scan completed, in scan order
    pub accounts_scanned: Vec<String>,
    /// Every scanned deployment, in scan order
    pub deployments: Vec<DeploymentRecord>,
    pub reservations: Vec<ReservationRecord>,
    /// Sum of capacity over provisioned deployments
    pub deployed_units: u64,
    pub reserved_units: u64,
    /// `100 * deployed / reserved`, only when reserved > 0
    pub utilization_percent: Option<f64>,
    pub status: CoverageStatus,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub generated_at: DateTime<Utc>,
}

impl ReconciliationReport {
    /// Check whether some accounts or reservations were omitted by the deadline.
    pub fn is_partial(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| {
                matches!(
                    a,
                    Annotation::Partial { .. }
                        | Annotation::ReservationsTimedOut
                        | Annotation::AccountDiscoveryTimedOut
                )
            })
    }

    pub fn has_annotation(&self, annotation: &Annotation) -> bool {
        self.annotations.contains(annotation)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessors() {
        assert_eq!(CoverageStatus::UnderUtilized { surplus: 5 }.surplus(), 5);
        assert_eq!(CoverageStatus::UnderUtilized { surplus: 5 }.deficit(), 0);
        assert_eq!(CoverageStatus::OverAllocated { deficit: 7 }.deficit(), 7);
        assert_eq!(CoverageStatus::FullyCovered.surplus(), 0);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(CoverageStatus::OverAllocated { deficit: 40 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "over_allocated", "deficit": 40}));
    }

    #[test]
    fn test_annotation_display() {
        assert_eq!(Annotation::ReservationsUnavailable.to_string(), "reservations unavailable");
        assert_eq!(
            Annotation::ReservationQueryFailed { message: "HTTP 429".to_string() }.to_string(),
            "reservation query failed: HTTP 429"
        );
    }
}
