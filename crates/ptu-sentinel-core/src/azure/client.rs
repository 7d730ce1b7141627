//! Read-only Azure Resource Manager client.

use std::sync::Arc;

use ptu_sentinel_types::{ScanError, SentinelConfig};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::credential::Credential;
use crate::error::AppResult;
use crate::utils::http::{create_client, display_url};

/// Upper bound on a `nextLink` chain; longer chains are treated as malformed.
pub const MAX_PAGES: usize = 200;

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

/// ARM client shared by the deployment, reservation and discovery listers.
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: Client,
    endpoint: String,
    credential: Arc<Credential>,
}

impl ArmClient {
    pub fn new(endpoint: &str, credential: Credential, timeout_secs: u64) -> AppResult<Self> {
        Ok(Self {
            http: create_client(timeout_secs)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential: Arc::new(credential),
        })
    }

    /// Client for `config.arm_endpoint` with credentials picked from the environment.
    pub fn from_config(config: &SentinelConfig) -> AppResult<Self> {
        Self::new(&config.arm_endpoint, Credential::from_env(), config.request_timeout_secs)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GET every page of a list endpoint, following `nextLink`.
    pub(crate) async fn get_paged<T: DeserializeOwned>(
        &self,
        path_and_query: &str,
        scope: &str,
    ) -> Result<Vec<T>, ScanError> {
        let mut url = format!("{}{}", self.endpoint, path_and_query);
        let mut items = Vec::new();

        for _ in 0..MAX_PAGES {
            let page: Page<T> = self.get_json(&url, scope).await?;
            items.extend(page.value);
            match page.next_link.filter(|l| !l.is_empty()) {
                Some(next) if self.is_same_origin(&next) => url = next,
                Some(next) => {
                    tracing::warn!(
                        scope,
                        next = %display_url(&next),
                        "Refusing cross-origin nextLink"
                    );
                    return Err(ScanError::MalformedResponse {
                        scope: scope.to_string(),
                        message: format!("nextLink leaves {}", self.endpoint),
                    });
                },
                None => return Ok(items),
            }
        }

        tracing::warn!(scope, pages = MAX_PAGES, "nextLink chain did not terminate");
        Err(ScanError::MalformedResponse {
            scope: scope.to_string(),
            message: format!("more than {} pages", MAX_PAGES),
        })
    }

    /// The bearer token is only ever sent back to the configured endpoint.
    fn is_same_origin(&self, link: &str) -> bool {
        match (Url::parse(&self.endpoint), Url::parse(link)) {
            (Ok(endpoint), Ok(link)) => endpoint.origin() == link.origin(),
            _ => false,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, scope: &str) -> Result<T, ScanError> {
        let token = self.credential.token(&self.http).await.map_err(|e| ScanError::Transient {
            scope: scope.to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(url = %display_url(url), "ARM GET");
        let response = self.http.get(url).bearer_auth(token).send().await.map_err(|e| {
            ScanError::Transient { scope: scope.to_string(), message: e.to_string() }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, scope, &body));
        }

        let bytes = response.bytes().await.map_err(|e| ScanError::Transient {
            scope: scope.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ScanError::MalformedResponse {
            scope: scope.to_string(),
            message: e.to_string(),
        })
    }
}

/// Map an ARM error status onto the scan error taxonomy.
pub fn classify_status(status: StatusCode, scope: &str, body: &str) -> ScanError {
    let message = arm_error_message(body).unwrap_or_else(|| format!("HTTP {}", status));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ScanError::AccessDenied { scope: scope.to_string() }
        },
        StatusCode::NOT_FOUND => ScanError::NotFound { resource: scope.to_string() },
        _ => ScanError::Transient { scope: scope.to_string(), message },
    }
}

/// Extract `error.code: error.message` from an ARM error body.
fn arm_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let code = error.get("code").and_then(|c| c.as_str()).unwrap_or("Error");
    let message = error.get("message").and_then(|m| m.as_str())?;
    Some(format!("{}: {}", code, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::FORBIDDEN, "a", "").is_access_denied());
        assert!(classify_status(StatusCode::UNAUTHORIZED, "a", "").is_access_denied());
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, "acct", ""),
            ScanError::NotFound { resource: "acct".to_string() }
        );
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "a", ""),
            ScanError::Transient { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "a", ""),
            ScanError::Transient { .. }
        ));
    }

    #[test]
    fn test_same_origin_check() {
        let client =
            ArmClient::new("https://management.azure.com/", Credential::static_token("t"), 5)
                .unwrap_or_else(|e| panic!("{e}"));

        assert!(client.is_same_origin("https://management.azure.com/subscriptions?page=2"));
        assert!(client.is_same_origin("https://management.azure.com:443/x"));
        assert!(!client.is_same_origin("https://attacker.example.com/subscriptions"));
        assert!(!client.is_same_origin("http://management.azure.com/x"));
        assert!(!client.is_same_origin("/relative/link"));
    }

    #[test]
    fn test_arm_error_message_is_surfaced() {
        let body = r#"{"error": {"code": "TooManyRequests", "message": "Slow down"}}"#;
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "scope", body);
        assert_eq!(
            err,
            ScanError::Transient {
                scope: "scope".to_string(),
                message: "TooManyRequests: Slow down".to_string()
            }
        );
    }
}
