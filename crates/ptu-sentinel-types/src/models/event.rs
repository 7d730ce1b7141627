//! Validated deployment-change events and account locators.

use serde::{Deserialize, Serialize};

/// Which resource provider hosts the deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeploymentSurface {
    /// `Microsoft.CognitiveServices/accounts`
    CognitiveServices,
    /// `Microsoft.MachineLearningServices/workspaces`
    MachineLearning,
}

impl DeploymentSurface {
    /// ARM provider namespace and resource type.
    pub fn provider_path(self) -> &'static str {
        match self {
            Self::CognitiveServices => "Microsoft.CognitiveServices/accounts",
            Self::MachineLearning => "Microsoft.MachineLearningServices/workspaces",
        }
    }
}

/// Identifies one account or workspace to scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountLocator {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
    pub surface: DeploymentSurface,
}

impl AccountLocator {
    pub fn cognitive(subscription_id: &str, resource_group: &str, name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            name: name.to_string(),
            surface: DeploymentSurface::CognitiveServices,
        }
    }

    /// ARM resource id of the account or workspace.
    pub fn resource_id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            self.subscription_id,
            self.resource_group,
            self.surface.provider_path(),
            self.name
        )
    }
}

impl std::fmt::Display for AccountLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resource_group, self.name)
    }
}

/// A deployment-write notification that passed intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEvent {
    pub event_id: String,
    pub event_type: String,
    pub account: AccountLocator,
    /// Deployment named in the resource id, if any
    pub deployment_name: Option<String>,
    pub operation_name: String,
    pub status: String,
}
