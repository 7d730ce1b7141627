//! Application State
//!
//! Holds the loaded configuration and the read capabilities shared by every
//! webhook delivery.

use anyhow::Result;
use std::sync::Arc;

use ptu_sentinel_core::azure::ArmClient;
use ptu_sentinel_core::{Capabilities, LogSink, TracingSink};
use ptu_sentinel_types::SentinelConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub config: SentinelConfig,
    pub capabilities: Capabilities,
    pub sink: Arc<dyn LogSink>,
}

impl AppState {
    pub fn new_with_components(
        config: SentinelConfig,
        capabilities: Capabilities,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self { inner: Arc::new(AppStateInner { config, capabilities, sink }) }
    }

    /// State backed by the ARM client, reporting through tracing.
    pub fn from_config(config: SentinelConfig) -> Result<Self> {
        let capabilities = arm_capabilities(&config)?;
        Ok(Self::new_with_components(config, capabilities, Arc::new(TracingSink)))
    }
}

/// One ARM client serves all three capabilities.
pub fn arm_capabilities(config: &SentinelConfig) -> Result<Capabilities> {
    let client = Arc::new(
        ArmClient::from_config(config)
            .map_err(|e| anyhow::anyhow!("Failed to create ARM client: {}", e))?,
    );
    tracing::info!(endpoint = client.endpoint(), "ARM client ready");
    Ok(Capabilities::new(client.clone(), client.clone()).with_discovery(client))
}
