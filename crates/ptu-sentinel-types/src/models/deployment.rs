//! Deployment models.

use serde::{Deserialize, Serialize};

/// SKU-name prefix that marks committed (provisioned throughput) capacity.
pub const PROVISIONED_SKU_PREFIX: &str = "Provisioned";

/// How a deployment is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingMode {
    /// Committed capacity units (PTU)
    Provisioned,
    /// Token-metered billing
    PayAsYouGo,
}

impl BillingMode {
    /// Classify a SKU name. Case-sensitive prefix match.
    pub fn from_sku_name(sku_name: &str) -> Self {
        if sku_name.starts_with(PROVISIONED_SKU_PREFIX) {
            Self::Provisioned
        } else {
            Self::PayAsYouGo
        }
    }

    pub fn is_provisioned(self) -> bool {
        self == Self::Provisioned
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Provisioned => "provisioned",
            Self::PayAsYouGo => "pay-as-you-go",
        }
    }
}

impl std::fmt::Display for BillingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw deployment entry as returned by a listing capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEntry {
    /// Deployment name
    pub name: String,
    /// Model name, when the listing exposes it
    #[serde(default)]
    pub model_name: Option<String>,
    /// SKU name (e.g. `ProvisionedManaged`, `GlobalStandard`)
    #[serde(default)]
    pub sku_name: Option<String>,
    /// Capacity in capacity units
    #[serde(default)]
    pub capacity: Option<u64>,
}

/// One active model deployment, classified by billing mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub account: String,
    pub resource_group: String,
    pub name: String,
    pub model_name: String,
    pub sku_name: String,
    /// Capacity units; 0 when the listing omitted it
    pub capacity: u64,
    pub billing_mode: BillingMode,
}

impl DeploymentRecord {
    /// Build a record from a raw listing entry, deriving the billing mode.
    pub fn from_entry(account: &str, resource_group: &str, entry: DeploymentEntry) -> Self {
        let sku_name = entry.sku_name.unwrap_or_default();
        let billing_mode = BillingMode::from_sku_name(&sku_name);
        Self {
            account: account.to_string(),
            resource_group: resource_group.to_string(),
            name: entry.name,
            model_name: entry.model_name.unwrap_or_else(|| "unknown".to_string()),
            sku_name,
            capacity: entry.capacity.unwrap_or(0),
            billing_mode,
        }
    }

    /// Capacity that counts toward the provisioned total.
    pub fn provisioned_capacity(&self) -> u64 {
        if self.billing_mode.is_provisioned() {
            self.capacity
        } else {
            0
        }
    }
}
