//! Bearer tokens for Azure Resource Manager.
//!
//! Sources, in the order `from_env` tries them:
//! 1. `AZURE_ACCESS_TOKEN` (e.g. from `az account get-access-token`)
//! 2. App Service / Functions managed identity (`IDENTITY_ENDPOINT` + `IDENTITY_HEADER`)
//! 3. VM instance metadata service (IMDS)
//!
//! `AZURE_CLIENT_ID` selects a user-assigned identity for 2 and 3.

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

pub const ARM_RESOURCE: &str = "https://management.azure.com/";

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const IMDS_API_VERSION: &str = "2018-02-01";

/// Refresh this many seconds before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 300;

#[derive(Debug, Clone)]
enum TokenSource {
    Static(String),
    AppService { endpoint: String, header: String },
    Imds { endpoint: String },
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_on: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_on: Option<serde_json::Value>,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

/// Token provider with an in-process cache.
#[derive(Debug)]
pub struct Credential {
    source: TokenSource,
    client_id: Option<String>,
    cache: Mutex<Option<CachedToken>>,
}

impl Credential {
    fn with_source(source: TokenSource, client_id: Option<String>) -> Self {
        Self { source, client_id, cache: Mutex::new(None) }
    }

    pub fn static_token(token: impl Into<String>) -> Self {
        Self::with_source(TokenSource::Static(token.into()), None)
    }

    pub fn app_service(
        endpoint: impl Into<String>,
        header: impl Into<String>,
        client_id: Option<String>,
    ) -> Self {
        Self::with_source(
            TokenSource::AppService { endpoint: endpoint.into(), header: header.into() },
            client_id,
        )
    }

    pub fn imds(endpoint: impl Into<String>, client_id: Option<String>) -> Self {
        Self::with_source(TokenSource::Imds { endpoint: endpoint.into() }, client_id)
    }

    /// Pick a token source from the process environment.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let client_id = var("AZURE_CLIENT_ID");

        if let Some(token) = var("AZURE_ACCESS_TOKEN") {
            tracing::info!("Using static ARM access token from AZURE_ACCESS_TOKEN");
            return Self::static_token(token);
        }
        if let (Some(endpoint), Some(header)) = (var("IDENTITY_ENDPOINT"), var("IDENTITY_HEADER"))
        {
            tracing::info!(user_assigned = client_id.is_some(), "Using App Service managed identity");
            return Self::app_service(endpoint, header, client_id);
        }
        tracing::info!(user_assigned = client_id.is_some(), "Using IMDS managed identity");
        Self::imds(IMDS_ENDPOINT, client_id)
    }

    /// Current bearer token, fetching a new one when the cached token is near expiry.
    pub async fn token(&self, client: &Client) -> AppResult<String> {
        if let TokenSource::Static(token) = &self.source {
            return Ok(token.clone());
        }

        let mut cache = self.cache.lock().await;
        let now = chrono::Utc::now().timestamp();
        if let Some(cached) = cache.as_ref() {
            if cached.expires_on - EXPIRY_MARGIN_SECS > now {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.fetch(client, now).await?;
        let token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    async fn fetch(&self, client: &Client, now: i64) -> AppResult<CachedToken> {
        let mut query: Vec<(&str, &str)> = vec![("resource", ARM_RESOURCE)];
        if let Some(id) = self.client_id.as_deref() {
            query.push(("client_id", id));
        }

        let request = match &self.source {
            TokenSource::Static(_) => {
                return Err(AppError::Credential("static token has no endpoint".to_string()))
            },
            TokenSource::AppService { endpoint, header } => {
                query.push(("api-version", APP_SERVICE_API_VERSION));
                client.get(endpoint).header("X-IDENTITY-HEADER", header)
            },
            TokenSource::Imds { endpoint } => {
                query.push(("api-version", IMDS_API_VERSION));
                client.get(endpoint).header("Metadata", "true")
            },
        };

        let response = request.query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Credential(format!(
                "managed identity endpoint returned {}: {}",
                status, text
            )));
        }

        let body: TokenResponse = response.json().await?;
        let expires_on = as_i64(body.expires_on.as_ref())
            .or_else(|| as_i64(body.expires_in.as_ref()).map(|secs| now + secs))
            .unwrap_or(now + 3600);
        tracing::debug!(expires_on, "Fetched managed identity token");

        Ok(CachedToken { access_token: body.access_token, expires_on })
    }
}

/// Token endpoints return numbers as either JSON numbers or strings.
fn as_i64(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_as_i64_accepts_strings_and_numbers() {
        assert_eq!(as_i64(Some(&json!("1700000000"))), Some(1_700_000_000));
        assert_eq!(as_i64(Some(&json!(3599))), Some(3599));
        assert_eq!(as_i64(Some(&json!(null))), None);
        assert_eq!(as_i64(None), None);
    }

    #[tokio::test]
    async fn test_static_token_skips_network() {
        let credential = Credential::static_token("abc");
        let token = credential.token(&Client::new()).await.unwrap();
        assert_eq!(token, "abc");
    }

    #[tokio::test]
    async fn test_app_service_token_is_cached() {
        let server = MockServer::start().await;
        let expires_on = (chrono::Utc::now().timestamp() + 3600).to_string();
        Mock::given(method("GET"))
            .and(header("X-IDENTITY-HEADER", "secret"))
            .and(query_param("client_id", "uami-1"))
            .and(query_param("api-version", APP_SERVICE_API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "mi-token",
                "expires_on": expires_on,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential =
            Credential::app_service(server.uri(), "secret", Some("uami-1".to_string()));
        let client = Client::new();

        assert_eq!(credential.token(&client).await.unwrap(), "mi-token");
        assert_eq!(credential.token(&client).await.unwrap(), "mi-token");
    }

    #[tokio::test]
    async fn test_identity_failure_is_credential_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("no identity"))
            .mount(&server)
            .await;

        let credential = Credential::imds(server.uri(), None);
        let err = credential.token(&Client::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Credential(_)));
    }
}
