//! Engine Configuration
//!
//! Endpoints, polling cadence and timeouts. Values come from `Default`
//! and can be overridden from `PLUTUS_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::{PlutusError, PlutusResult};
use crate::portfolio::Cluster;
use crate::types::Chain;

/// Default native-balance poll cadence
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_500;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub solana_rpc_url: String,
    pub ethereum_rpc_url: String,
    /// DAS-compatible metadata endpoint
    pub metadata_url: String,
    /// Appended as `api-key` to metadata requests when set
    pub metadata_api_key: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    /// Token-list entries outside this cluster are ignored
    pub token_cluster: Cluster,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solana_rpc_url: "https://api.devnet.solana.com".into(),
            ethereum_rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".into(),
            metadata_url: "https://devnet.helius-rpc.com/".into(),
            metadata_api_key: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_cluster: Cluster::Devnet,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `PLUTUS_*` variables that are set
    pub fn from_env() -> PlutusResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> PlutusResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("PLUTUS_SOLANA_RPC_URL") {
            config.solana_rpc_url = v;
        }
        if let Some(v) = lookup("PLUTUS_ETHEREUM_RPC_URL") {
            config.ethereum_rpc_url = v;
        }
        if let Some(v) = lookup("PLUTUS_METADATA_URL") {
            config.metadata_url = v;
        }
        if let Some(v) = lookup("PLUTUS_METADATA_API_KEY").filter(|v| !v.is_empty()) {
            config.metadata_api_key = Some(v);
        }
        if let Some(v) = lookup("PLUTUS_POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_number("PLUTUS_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("PLUTUS_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("PLUTUS_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("PLUTUS_TOKEN_CLUSTER") {
            config.token_cluster = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlutusResult<()> {
        validate_endpoint("solana_rpc_url", &self.solana_rpc_url)?;
        validate_endpoint("ethereum_rpc_url", &self.ethereum_rpc_url)?;
        validate_endpoint("metadata_url", &self.metadata_url)?;

        if self.poll_interval_ms == 0 {
            return Err(PlutusError::config("poll_interval_ms must be non-zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(PlutusError::config("request_timeout_secs must be non-zero"));
        }
        Ok(())
    }

    pub fn rpc_url(&self, chain: Chain) -> &str {
        match chain {
            Chain::Solana => &self.solana_rpc_url,
            Chain::Ethereum => &self.ethereum_rpc_url,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("solana_rpc_url", &self.solana_rpc_url)
            .field("ethereum_rpc_url", &self.ethereum_rpc_url)
            .field("metadata_url", &self.metadata_url)
            .field(
                "metadata_api_key",
                &self.metadata_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("token_cluster", &self.token_cluster)
            .finish()
    }
}

fn parse_number(key: &str, value: &str) -> PlutusResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| PlutusError::config(format!("{} must be an integer, got '{}'", key, value)))
}

/// HTTPS everywhere, plain HTTP only for local development hosts
fn validate_endpoint(name: &str, endpoint: &str) -> PlutusResult<()> {
    let parsed = Url::parse(endpoint)
        .map_err(|e| PlutusError::config(format!("{} is not a valid URL: {}", name, e)))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => match parsed.host_str() {
            Some("localhost") | Some("127.0.0.1") | Some("[::1]") => Ok(()),
            _ => Err(PlutusError::config(format!(
                "{} must use HTTPS for remote hosts",
                name
            ))),
        },
        other => Err(PlutusError::config(format!(
            "{} has unsupported scheme: {}",
            name, other
        ))),
    }
}
