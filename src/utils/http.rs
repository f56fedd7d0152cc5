//! HTTP Client Construction
//!
//! Collaborators share one pooled async client per endpoint family.

use reqwest::Client;
use std::time::Duration;

use crate::error::{PlutusError, PlutusResult};

const USER_AGENT: &str = concat!("plutus-core/", env!("CARGO_PKG_VERSION"));

/// Build a pooled async client with the given request timeout
pub fn build_client(timeout: Duration) -> PlutusResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(5)
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| PlutusError::config(format!("Failed to create HTTP client: {}", e)))
}

/// Host part of an endpoint, safe to log (drops paths and query strings)
pub fn endpoint_host(endpoint: &str) -> String {
    url::Url::parse(endpoint)
        .ok()
        .and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(port) => format!("{}:{}", h, port),
                None => h.to_string(),
            })
        })
        .unwrap_or_else(|| "[invalid-endpoint]".to_string())
}
