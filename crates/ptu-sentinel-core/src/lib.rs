//! # PTU Sentinel Core
//!
//! Reconciles provisioned-throughput (PTU) deployments against capacity
//! reservations whenever a deployment changes.
//!
//! ## Architecture
//!
//! ```text
//! ptu-sentinel-core/src/
//! ├── traits.rs         # Capability seams (listers, discovery, log sink)
//! ├── modules/
//! │   ├── intake.rs     # Event Grid payload -> DeploymentEvent
//! │   ├── scanner.rs    # Per-account scans, bounded fan-out
//! │   ├── reservations.rs
//! │   ├── comparator.rs # Pure capacity comparison
//! │   ├── reporter.rs   # Deterministic text report
//! │   └── engine.rs     # reconcile() entry point
//! └── azure/            # ARM client implementing the capabilities
//! ```
//!
//! The engine never writes to any cloud resource and keeps no state between
//! passes.

#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::float_cmp,
        clippy::assertions_on_result_states
    )
)]

pub mod azure;
pub mod error;
pub mod modules;
pub mod traits;
pub mod utils;

// Re-export commonly used types
pub use error::{AppError, AppResult};
pub use modules::engine::{reconcile, Capabilities};
pub use modules::logger::{BufferSink, TracingSink};
pub use traits::{AccountDiscovery, DeploymentLister, LogSink, ReservationLister, Severity};
