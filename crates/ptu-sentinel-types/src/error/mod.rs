//! Typed error definitions for PTU Sentinel.
//!
//! - **Serializable** so failures can be returned from the webhook
//! - **Matchable** so the engine can decide between degrading and failing

mod event;
mod scan;

pub use event::EventError;
pub use scan::ScanError;
