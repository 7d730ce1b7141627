//! Capability traits injected into the reconciliation engine.
//!
//! The engine only reads through these seams. The ARM client in
//! [`crate::azure`] implements the listers; tests supply in-memory fakes.

use async_trait::async_trait;
use ptu_sentinel_types::{
    AccountLocator, DeploymentEntry, ReservationEntry, ReservationScope, ScanError,
};

/// Lists model deployments under one account or workspace.
#[async_trait]
pub trait DeploymentLister: Send + Sync {
    async fn list_deployments(
        &self,
        account: &AccountLocator,
    ) -> Result<Vec<DeploymentEntry>, ScanError>;
}

/// Lists capacity reservations visible within a scope.
#[async_trait]
pub trait ReservationLister: Send + Sync {
    /// May fail with [`ScanError::AccessDenied`] when the identity lacks the reader role.
    async fn list_reservations(
        &self,
        scope: &ReservationScope,
    ) -> Result<Vec<ReservationEntry>, ScanError>;
}

/// Enumerates accounts to scan in multi-account mode.
#[async_trait]
pub trait AccountDiscovery: Send + Sync {
    async fn list_accounts(&self, subscription_id: &str) -> Result<Vec<AccountLocator>, ScanError>;
}

/// Severity attached to each rendered report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Destination for rendered report lines.
pub trait LogSink: Send + Sync {
    fn emit(&self, severity: Severity, text: &str);
}
