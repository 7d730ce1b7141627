//! Sentinel configuration model.

use serde::{Deserialize, Serialize};

use super::{AccountLocator, ReservationScope};

/// Which accounts a pass scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScanMode {
    /// Only the account named by the triggering event
    #[default]
    TriggeringAccount,
    /// Every account discovered in the event's subscription
    Subscription,
    /// A fixed list of accounts, regardless of the event.
    ///
    /// Reservations are still read for the event's subscription only. When the
    /// list spans subscriptions, use `ReservationScopeKind::Tenant` so every
    /// subscription's reservations are counted.
    Explicit { accounts: Vec<AccountLocator> },
}

/// Breadth of the reservation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationScopeKind {
    /// Reservations applying to the event's subscription
    #[default]
    Subscription,
    /// All reservations visible to the identity
    Tenant,
}

impl ReservationScopeKind {
    pub fn resolve(self, subscription_id: &str) -> ReservationScope {
        match self {
            Self::Subscription => ReservationScope::Subscription(subscription_id.to_string()),
            Self::Tenant => ReservationScope::Tenant,
        }
    }
}

/// Runtime configuration for a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub scan_mode: ScanMode,
    /// Upper bound on concurrent per-account scans
    pub max_parallel_scans: usize,
    /// Overall deadline for one pass
    pub timeout_secs: u64,
    /// Resolved against the triggering event's subscription in every scan mode
    pub reservation_scope: ReservationScopeKind,
    /// Substring a reservation's SKU description must contain; empty keeps all
    pub reservation_sku_filter: String,
    /// Azure Resource Manager base URL
    pub arm_endpoint: String,
    /// Per-request HTTP timeout for ARM calls
    pub request_timeout_secs: u64,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            scan_mode: ScanMode::default(),
            max_parallel_scans: 10,
            timeout_secs: 60,
            reservation_scope: ReservationScopeKind::default(),
            reservation_sku_filter: "Provisioned Throughput".to_string(),
            arm_endpoint: "https://management.azure.com".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl SentinelConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_parallel_scans == 0 {
            return Err("max_parallel_scans must be at least 1".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if !self.arm_endpoint.starts_with("http://") && !self.arm_endpoint.starts_with("https://")
        {
            return Err(format!("arm_endpoint is not an http(s) URL: {}", self.arm_endpoint));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SentinelConfig =
            serde_json::from_str(r#"{"scan_mode": {"mode": "subscription"}}"#).unwrap();

        assert_eq!(config.scan_mode, ScanMode::Subscription);
        assert_eq!(config.max_parallel_scans, 10);
        assert_eq!(config.reservation_sku_filter, "Provisioned Throughput");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_parallelism() {
        let config = SentinelConfig { max_parallel_scans: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_accounts_roundtrip_shape() {
        let json = r#"{
            "scan_mode": {
                "mode": "explicit",
                "accounts": [{
                    "subscription_id": "sub",
                    "resource_group": "rg",
                    "name": "acct",
                    "surface": "CognitiveServices"
                }]
            }
        }"#;
        let config: SentinelConfig = serde_json::from_str(json).unwrap();
        let ScanMode::Explicit { accounts } = config.scan_mode else {
            panic!("expected explicit mode");
        };
        assert_eq!(accounts, vec![AccountLocator::cognitive("sub", "rg", "acct")]);
    }
}
