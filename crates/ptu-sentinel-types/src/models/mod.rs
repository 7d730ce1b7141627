//! Core domain models for PTU Sentinel.

mod config;
mod deployment;
mod event;
mod report;
mod reservation;

pub use config::{ReservationScopeKind, ScanMode, SentinelConfig};
pub use deployment::{BillingMode, DeploymentEntry, DeploymentRecord, PROVISIONED_SKU_PREFIX};
pub use event::{AccountLocator, DeploymentEvent, DeploymentSurface};
pub use report::{Annotation, CoverageStatus, ReconciliationReport};
pub use reservation::{ReservationEntry, ReservationRecord, ReservationScope};
