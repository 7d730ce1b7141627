//! # PTU Sentinel Types
//!
//! Core types, models, and error definitions for PTU Sentinel.
//!
//! - **`error`** - Typed errors for scans and inbound events
//! - **`models`** - Deployment, reservation, report, event and config models
//!
//! ## Architecture Role
//!
//! ```text
//!            ptu-sentinel-types (this crate)
//!                      │
//!                      ▼
//!             ptu-sentinel-core
//!                      │
//!                      ▼
//!            ptu-sentinel-server
//! ```
//!
//! Records are constructed fresh for every reconciliation pass and never
//! mutated afterwards, so everything here is plain data: `Clone`,
//! serde-serializable and comparable in tests.

pub mod error;
pub mod models;

pub use error::{EventError, ScanError};

pub use models::{
    AccountLocator, Annotation, BillingMode, CoverageStatus, DeploymentEntry, DeploymentEvent,
    DeploymentRecord, DeploymentSurface, ReconciliationReport, ReservationEntry,
    ReservationRecord, ReservationScope, ScanMode, SentinelConfig,
};
