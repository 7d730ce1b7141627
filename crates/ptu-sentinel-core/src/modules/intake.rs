//! Event intake: turns an Event Grid delivery into a validated [`DeploymentEvent`].

use ptu_sentinel_types::{AccountLocator, DeploymentEvent, DeploymentSurface, EventError};
use serde::{Deserialize, Serialize};

/// Deployment-write operations that trigger a reconciliation pass.
pub const RECOGNIZED_OPERATIONS: [(&str, DeploymentSurface); 3] = [
    ("Microsoft.CognitiveServices/accounts/deployments/write", DeploymentSurface::CognitiveServices),
    (
        "Microsoft.MachineLearningServices/workspaces/onlineEndpoints/deployments/write",
        DeploymentSurface::MachineLearning,
    ),
    (
        "Microsoft.MachineLearningServices/workspaces/serverlessEndpoints/write",
        DeploymentSurface::MachineLearning,
    ),
];

pub const SUCCEEDED_STATUS: &str = "Succeeded";

/// Event type Event Grid uses for the webhook validation handshake.
pub const SUBSCRIPTION_VALIDATION_EVENT: &str = "Microsoft.EventGrid.SubscriptionValidationEvent";

/// Event Grid schema envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventGridEvent {
    pub id: String,
    pub event_type: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EventGridEvent {
    pub fn is_subscription_validation(&self) -> bool {
        self.event_type == SUBSCRIPTION_VALIDATION_EVENT
    }

    /// Validation code carried by a subscription-validation event.
    pub fn validation_code(&self) -> Option<&str> {
        self.data.get("validationCode").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceEventData {
    operation_name: Option<String>,
    status: Option<String>,
    resource_uri: Option<String>,
    subscription_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<EventGridEvent>),
    One(Box<EventGridEvent>),
}

/// Parse a delivery body; Event Grid posts arrays but a bare event is accepted too.
pub fn parse_events(body: &str) -> Result<Vec<EventGridEvent>, EventError> {
    match serde_json::from_str::<OneOrMany>(body)? {
        OneOrMany::Many(events) => Ok(events),
        OneOrMany::One(event) => Ok(vec![*event]),
    }
}

/// Validate an event against the operation/status allow-list and extract identifiers.
pub fn validate_event(event: &EventGridEvent) -> Result<DeploymentEvent, EventError> {
    let data: ResourceEventData = if event.data.is_null() {
        ResourceEventData::default()
    } else {
        serde_json::from_value(event.data.clone())?
    };

    let operation_name = required(data.operation_name, "data.operationName")?;
    let status = required(data.status, "data.status")?;

    let surface = recognize_operation(&operation_name)
        .ok_or_else(|| EventError::UnsupportedOperation { operation: operation_name.clone() })?;

    if !status.eq_ignore_ascii_case(SUCCEEDED_STATUS) {
        return Err(EventError::NotSucceeded { status });
    }

    let resource_id = data
        .resource_uri
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| event.subject.clone());
    let mut parsed = parse_resource_id(&resource_id, surface)?;
    if parsed.account.subscription_id.is_empty() {
        parsed.account.subscription_id =
            required(data.subscription_id, "data.subscriptionId")?;
    }

    Ok(DeploymentEvent {
        event_id: event.id.clone(),
        event_type: event.event_type.clone(),
        account: parsed.account,
        deployment_name: parsed.deployment,
        operation_name,
        status,
    })
}

/// Surface for a recognized operation name (ASCII case-insensitive).
pub fn recognize_operation(operation_name: &str) -> Option<DeploymentSurface> {
    RECOGNIZED_OPERATIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(operation_name))
        .map(|(_, surface)| *surface)
}

fn required(value: Option<String>, field: &str) -> Result<String, EventError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| EventError::MissingField { field: field.to_string() })
}

#[derive(Debug)]
struct ParsedResource {
    account: AccountLocator,
    deployment: Option<String>,
}

/// Split a resource id into `(type, name)` pairs, reading keys only at key
/// positions. `providers/{namespace}` is consumed as a unit, so a resource
/// group or account named like a key cannot shift the pairing.
fn resource_id_pairs(resource_id: &str) -> Vec<(&str, &str)> {
    let mut segments = resource_id.split('/').filter(|s| !s.is_empty());
    let mut pairs = Vec::new();
    while let Some(key) = segments.next() {
        let Some(value) = segments.next() else { break };
        if !key.eq_ignore_ascii_case("providers") {
            pairs.push((key, value));
        }
    }
    pairs
}

fn parse_resource_id(
    resource_id: &str,
    surface: DeploymentSurface,
) -> Result<ParsedResource, EventError> {
    let pairs = resource_id_pairs(resource_id);
    let value_of = |key: &str| {
        pairs.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| (*v).to_string())
    };

    let account_key = match surface {
        DeploymentSurface::CognitiveServices => "accounts",
        DeploymentSurface::MachineLearning => "workspaces",
    };
    let invalid = |message: &str| EventError::InvalidResourceId {
        resource_id: resource_id.to_string(),
        message: message.to_string(),
    };

    let resource_group = value_of("resourceGroups").ok_or_else(|| invalid("no resource group"))?;
    let name = value_of(account_key).ok_or_else(|| invalid("no account or workspace"))?;
    let deployment = value_of("deployments").or_else(|| value_of("serverlessEndpoints"));

    Ok(ParsedResource {
        account: AccountLocator {
            subscription_id: value_of("subscriptions").unwrap_or_default(),
            resource_group,
            name,
            surface,
        },
        deployment,
    })
}

#[cfg(test)]
#[path = "intake_tests.rs"]
mod tests;
