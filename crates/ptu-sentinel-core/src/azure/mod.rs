//! Azure Resource Manager backed capabilities.
//!
//! `ArmClient` implements [`DeploymentLister`](crate::traits::DeploymentLister),
//! [`ReservationLister`](crate::traits::ReservationLister) and
//! [`AccountDiscovery`](crate::traits::AccountDiscovery). Every call is a GET.

pub mod client;
pub mod credential;
mod listing;

pub use client::{classify_status, ArmClient};
pub use credential::Credential;
