//! HTTP client construction for ARM calls.

use reqwest::Client;

use crate::error::{AppError, AppResult};

/// Strip query strings (skip tokens, api versions) from a URL for logging.
pub fn display_url(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| format!("{}://{}{}", u.scheme(), u.host_str().unwrap_or("?"), u.path()))
        .unwrap_or_else(|_| "<invalid-url>".to_string())
}

/// Create HTTP client with the given request timeout.
pub fn create_client(timeout_secs: u64) -> AppResult<Client> {
    base_builder(timeout_secs)
        .build()
        .map_err(|e| AppError::Config(format!("HTTP client builder failed: {e}")))
}

/// Shared builder with keepalive settings.
fn base_builder(timeout_secs: u64) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .tcp_nodelay(true)
        .http2_keep_alive_interval(std::time::Duration::from_secs(25))
        .http2_keep_alive_timeout(std::time::Duration::from_secs(10))
        .http2_keep_alive_while_idle(true)
        .user_agent(concat!("ptu-sentinel/", env!("CARGO_PKG_VERSION")))
}
