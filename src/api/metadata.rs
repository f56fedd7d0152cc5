//! Token Metadata Collaborator
//!
//! Batched lookups against a DAS (Digital Asset Standard) endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use url::Url;

use crate::config::EngineConfig;
use crate::error::{PlutusError, PlutusResult};
use crate::types::TokenMetadata;

use super::rpc::RpcClient;

/// Most ids the DAS API accepts per `getAssetBatch`
pub const MAX_BATCH_SIZE: usize = 1000;

/// Off-chain metadata lookups keyed by mint id
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Resolve as many ids as possible; ids missing from the map are unresolved
    ///
    /// Callers send at most `MAX_BATCH_SIZE` ids per call.
    async fn fetch_batch(&self, ids: &[String]) -> PlutusResult<HashMap<String, TokenMetadata>>;
}

pub struct DasMetadataClient {
    rpc: RpcClient,
}

#[derive(Deserialize)]
struct DasAsset {
    id: String,
    #[serde(default)]
    content: Option<DasContent>,
    #[serde(default)]
    token_info: Option<DasTokenInfo>,
}

#[derive(Deserialize)]
struct DasContent {
    #[serde(default)]
    metadata: Option<DasMetadata>,
    #[serde(default)]
    links: Option<DasLinks>,
}

#[derive(Deserialize)]
struct DasMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

#[derive(Deserialize)]
struct DasLinks {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Deserialize)]
struct DasTokenInfo {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    decimals: Option<u8>,
}

impl DasAsset {
    fn into_metadata(self) -> (String, TokenMetadata) {
        let (name, symbol, icon_url) = match self.content {
            Some(content) => {
                let (name, symbol) = content
                    .metadata
                    .map(|m| (m.name, m.symbol))
                    .unwrap_or((None, None));
                (name, symbol, content.links.and_then(|l| l.image))
            }
            None => (None, None, None),
        };

        let (info_symbol, decimals) = self
            .token_info
            .map(|t| (t.symbol, t.decimals))
            .unwrap_or((None, None));

        let metadata = TokenMetadata {
            name: non_empty(name).unwrap_or_else(|| TokenMetadata::UNKNOWN.to_string()),
            symbol: non_empty(symbol)
                .or_else(|| non_empty(info_symbol))
                .unwrap_or_else(|| TokenMetadata::UNKNOWN.to_string()),
            icon_url: non_empty(icon_url),
            decimals,
        };

        (self.id, metadata)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl DasMetadataClient {
    pub fn new(config: &EngineConfig) -> PlutusResult<Self> {
        let endpoint = metadata_endpoint(&config.metadata_url, config.metadata_api_key.as_deref())?;
        Ok(Self {
            rpc: RpcClient::new(endpoint, config.request_timeout())?,
        })
    }
}

#[async_trait]
impl MetadataClient for DasMetadataClient {
    async fn fetch_batch(&self, ids: &[String]) -> PlutusResult<HashMap<String, TokenMetadata>> {
        let method = "getAssetBatch";
        if ids.len() > MAX_BATCH_SIZE {
            return Err(PlutusError::metadata(format!(
                "{} accepts at most {} ids, got {}",
                method,
                MAX_BATCH_SIZE,
                ids.len()
            )));
        }
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let assets: Vec<Option<DasAsset>> = self
            .rpc
            .call(method, json!({ "ids": ids }))
            .await
            .map_err(|e| self.rpc.metadata_error(method, e))?;

        Ok(assets.into_iter().flatten().map(DasAsset::into_metadata).collect())
    }
}

/// Attach the API key as a query parameter
fn metadata_endpoint(base: &str, api_key: Option<&str>) -> PlutusResult<String> {
    let mut url = Url::parse(base)
        .map_err(|e| PlutusError::config(format!("Invalid metadata URL: {}", e)))?;

    if let Some(key) = api_key {
        url.query_pairs_mut().append_pair("api-key", key);
    }

    Ok(url.into())
}
