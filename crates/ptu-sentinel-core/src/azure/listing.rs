//! Capability implementations backed by ARM list endpoints.

use async_trait::async_trait;
use futures::future::try_join_all;
use ptu_sentinel_types::{
    AccountLocator, DeploymentEntry, DeploymentSurface, ReservationEntry, ReservationScope,
    ScanError,
};
use serde::Deserialize;

use super::client::ArmClient;
use crate::traits::{AccountDiscovery, DeploymentLister, ReservationLister};

const COGNITIVE_API_VERSION: &str = "2023-05-01";
const ML_API_VERSION: &str = "2024-04-01";
const RESERVATIONS_API_VERSION: &str = "2022-11-01";

/// Account kinds that can host model deployments.
const DEPLOYMENT_ACCOUNT_KINDS: [&str; 2] = ["OpenAI", "AIServices"];

#[derive(Debug, Deserialize)]
struct ArmSku {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    capacity: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ArmDeployment {
    name: String,
    #[serde(default)]
    sku: Option<ArmSku>,
    #[serde(default)]
    properties: serde_json::Value,
}

impl ArmDeployment {
    /// Cognitive Services nests `{ "model": { "name": .. } }`; ML online deployments
    /// carry a model asset id string; serverless endpoints use `modelSettings.modelId`.
    fn model_name(&self) -> Option<String> {
        let model = self
            .properties
            .get("model")
            .or_else(|| self.properties.pointer("/modelSettings/modelId"))?;
        match model {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(o) => o.get("name").and_then(|n| n.as_str()).map(String::from),
            _ => None,
        }
    }

    fn into_entry(self) -> DeploymentEntry {
        let model_name = self.model_name();
        let (sku_name, capacity) = match self.sku {
            Some(sku) => (sku.name, sku.capacity),
            None => (None, None),
        };
        DeploymentEntry { name: self.name, model_name, sku_name, capacity }
    }
}

#[derive(Debug, Deserialize)]
struct ArmNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArmAccount {
    id: String,
    name: String,
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmReservationProperties {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    quantity: Option<u64>,
    #[serde(default)]
    sku_description: Option<String>,
    #[serde(default)]
    provisioning_state: Option<String>,
    #[serde(default)]
    applied_scope_type: Option<String>,
    #[serde(default)]
    applied_scopes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ArmReservation {
    name: String,
    properties: ArmReservationProperties,
}

impl From<ArmReservation> for ReservationEntry {
    fn from(r: ArmReservation) -> Self {
        let p = r.properties;
        Self {
            name: r.name,
            display_name: p.display_name,
            quantity: p.quantity,
            sku_description: p.sku_description,
            provisioning_state: p.provisioning_state,
            applied_scope_type: p.applied_scope_type,
            applied_scopes: p.applied_scopes.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl DeploymentLister for ArmClient {
    async fn list_deployments(
        &self,
        account: &AccountLocator,
    ) -> Result<Vec<DeploymentEntry>, ScanError> {
        let base = account.resource_id();
        let scope = account.to_string();

        let deployments: Vec<ArmDeployment> = match account.surface {
            DeploymentSurface::CognitiveServices => {
                self.get_paged(
                    &format!("{}/deployments?api-version={}", base, COGNITIVE_API_VERSION),
                    &scope,
                )
                .await?
            },
            DeploymentSurface::MachineLearning => {
                let endpoints: Vec<ArmNamed> = self
                    .get_paged(
                        &format!("{}/onlineEndpoints?api-version={}", base, ML_API_VERSION),
                        &scope,
                    )
                    .await?;
                let scope = scope.as_str();
                let online = try_join_all(endpoints.iter().map(|ep| {
                    let url = format!(
                        "{}/onlineEndpoints/{}/deployments?api-version={}",
                        base, ep.name, ML_API_VERSION
                    );
                    async move { self.get_paged::<ArmDeployment>(&url, scope).await }
                }))
                .await?;
                let serverless: Vec<ArmDeployment> = self
                    .get_paged(
                        &format!("{}/serverlessEndpoints?api-version={}", base, ML_API_VERSION),
                        scope,
                    )
                    .await?;
                online.into_iter().flatten().chain(serverless).collect()
            },
        };

        Ok(deployments.into_iter().map(ArmDeployment::into_entry).collect())
    }
}

#[async_trait]
impl ReservationLister for ArmClient {
    async fn list_reservations(
        &self,
        scope: &ReservationScope,
    ) -> Result<Vec<ReservationEntry>, ScanError> {
        let scope_label = scope.to_string();
        let orders: Vec<ArmNamed> = self
            .get_paged(
                &format!(
                    "/providers/Microsoft.Capacity/reservationOrders?api-version={}",
                    RESERVATIONS_API_VERSION
                ),
                &scope_label,
            )
            .await?;

        let scope_label = scope_label.as_str();
        let per_order = try_join_all(orders.iter().map(|order| {
            let url = format!(
                "/providers/Microsoft.Capacity/reservationOrders/{}/reservations?api-version={}",
                order.name, RESERVATIONS_API_VERSION
            );
            async move { self.get_paged::<ArmReservation>(&url, scope_label).await }
        }))
        .await?;

        Ok(per_order.into_iter().flatten().map(ReservationEntry::from).collect())
    }
}

#[async_trait]
impl AccountDiscovery for ArmClient {
    async fn list_accounts(&self, subscription_id: &str) -> Result<Vec<AccountLocator>, ScanError> {
        let accounts: Vec<ArmAccount> = self
            .get_paged(
                &format!(
                    "/subscriptions/{}/providers/Microsoft.CognitiveServices/accounts?api-version={}",
                    subscription_id, COGNITIVE_API_VERSION
                ),
                subscription_id,
            )
            .await?;

        Ok(accounts
            .into_iter()
            .filter(|a| {
                a.kind.as_deref().is_some_and(|k| {
                    DEPLOYMENT_ACCOUNT_KINDS.iter().any(|known| known.eq_ignore_ascii_case(k))
                })
            })
            .filter_map(|a| {
                let resource_group = resource_group_of(&a.id)?;
                Some(AccountLocator::cognitive(subscription_id, &resource_group, &a.name))
            })
            .collect())
    }
}

fn resource_group_of(resource_id: &str) -> Option<String> {
    let segments: Vec<&str> = resource_id.split('/').filter(|s| !s.is_empty()).collect();
    segments
        .windows(2)
        .find(|pair| pair[0].eq_ignore_ascii_case("resourceGroups"))
        .map(|pair| pair[1].to_string())
}
