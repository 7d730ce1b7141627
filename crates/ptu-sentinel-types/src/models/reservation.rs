//! Reservation models.

use serde::{Deserialize, Serialize};

/// Scope the reservation reader queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReservationScope {
    /// Reservations that apply to one subscription
    Subscription(String),
    /// Every reservation visible to the caller
    Tenant,
}

impl std::fmt::Display for ReservationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscription(id) => write!(f, "subscription {}", id),
            Self::Tenant => f.write_str("tenant"),
        }
    }
}

/// Raw reservation entry as returned by a listing capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationEntry {
    /// Reservation resource name
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<u64>,
    /// e.g. "Provisioned Throughput Unit - Global"
    #[serde(default)]
    pub sku_description: Option<String>,
    #[serde(default)]
    pub provisioning_state: Option<String>,
    /// "Shared" or "Single"
    #[serde(default)]
    pub applied_scope_type: Option<String>,
    /// Resource ids the reservation applies to when single-scoped
    #[serde(default)]
    pub applied_scopes: Vec<String>,
}

impl ReservationEntry {
    /// Check whether the SKU description contains `filter`. An empty filter matches all.
    pub fn matches_sku(&self, filter: &str) -> bool {
        filter.is_empty()
            || self.sku_description.as_deref().is_some_and(|d| d.contains(filter))
    }

    /// Reservations without a state are treated as active.
    pub fn is_active(&self) -> bool {
        self.provisioning_state.as_deref().map_or(true, |s| s.eq_ignore_ascii_case("Succeeded"))
    }

    /// Check whether this reservation offsets billing within `scope`.
    pub fn applies_to(&self, scope: &ReservationScope) -> bool {
        let ReservationScope::Subscription(subscription_id) = scope else {
            return true;
        };
        if self.applied_scopes.is_empty()
            || self.applied_scope_type.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("Shared"))
        {
            return true;
        }
        let needle = format!("/subscriptions/{}", subscription_id.to_ascii_lowercase());
        self.applied_scopes.iter().any(|s| s.to_ascii_lowercase().starts_with(&needle))
    }
}

/// One active capacity reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub name: String,
    pub quantity: u64,
    pub scope: String,
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

impl ReservationRecord {
    pub fn from_entry(entry: ReservationEntry) -> Self {
        let scope = match entry.applied_scope_type.as_deref() {
            Some("Single") if !entry.applied_scopes.is_empty() => entry.applied_scopes.join(","),
            Some(scope_type) => scope_type.to_string(),
            None => "Shared".to_string(),
        };
        Self {
            name: entry.display_name.unwrap_or(entry.name),
            quantity: entry.quantity.unwrap_or(0),
            scope,
            provisioning_state: entry.provisioning_state,
        }
    }
}
