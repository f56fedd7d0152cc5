//! Static Token Registry
//!
//! Metadata for well-known mints, loaded from a Solana token-list document:
//! `{ "tokens": [{ "chainId", "address", "name", "symbol", "decimals", "logoURI" }] }`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PlutusError, PlutusResult};
use crate::log_debug;
use crate::types::TokenMetadata;

/// Solana cluster, identified in token lists by chain id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    MainnetBeta,
    Testnet,
    Devnet,
}

impl Cluster {
    pub fn chain_id(&self) -> u64 {
        match self {
            Cluster::MainnetBeta => 101,
            Cluster::Testnet => 102,
            Cluster::Devnet => 103,
        }
    }
}

impl FromStr for Cluster {
    type Err = PlutusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet-beta" | "mainnet" | "101" => Ok(Cluster::MainnetBeta),
            "testnet" | "102" => Ok(Cluster::Testnet),
            "devnet" | "103" => Ok(Cluster::Devnet),
            other => Err(PlutusError::config(format!("Unknown cluster: {}", other))),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::MainnetBeta => write!(f, "mainnet-beta"),
            Cluster::Testnet => write!(f, "testnet"),
            Cluster::Devnet => write!(f, "devnet"),
        }
    }
}

#[derive(Deserialize)]
struct TokenList {
    tokens: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenListEntry {
    chain_id: u64,
    address: String,
    name: String,
    symbol: String,
    decimals: u8,
    #[serde(rename = "logoURI", default)]
    logo_uri: Option<String>,
}

/// Mint id → metadata
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    entries: HashMap<String, TokenMetadata>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mint: impl Into<String>, metadata: TokenMetadata) {
        self.entries.insert(mint.into(), metadata);
    }

    pub fn get(&self, mint: &str) -> Option<&TokenMetadata> {
        self.entries.get(mint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a token list, keeping entries for `cluster` only
    ///
    /// Individual malformed entries are skipped.
    pub fn from_token_list_json(json: &str, cluster: Cluster) -> PlutusResult<Self> {
        let list: TokenList = serde_json::from_str(json)?;
        let mut registry = Self::new();
        let mut skipped = 0usize;

        for raw in list.tokens {
            match serde_json::from_value::<TokenListEntry>(raw) {
                Ok(entry) if entry.chain_id == cluster.chain_id() => {
                    registry.insert(
                        entry.address,
                        TokenMetadata {
                            name: entry.name,
                            symbol: entry.symbol,
                            icon_url: entry.logo_uri.filter(|u| !u.is_empty()),
                            decimals: Some(entry.decimals),
                        },
                    );
                }
                Ok(_) => {}
                Err(_) => skipped += 1,
            }
        }

        log_debug!(
            "registry",
            "Token list loaded",
            cluster = cluster,
            tokens = registry.len(),
            skipped = skipped
        );
        Ok(registry)
    }

    pub fn from_file(path: impl AsRef<Path>, cluster: Cluster) -> PlutusResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PlutusError::config(format!(
                "Cannot read token list {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_token_list_json(&raw, cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"{
        "name": "Solana Token List",
        "tokens": [
            { "chainId": 101, "address": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
              "name": "USD Coin", "symbol": "USDC", "decimals": 6,
              "logoURI": "https://example.com/usdc.png" },
            { "chainId": 103, "address": "Gh9ZwEmdLJ8DscKNTkTqPbNwLNNBjuSzaG9Vp2KGtKJr",
              "name": "USD Coin Dev", "symbol": "USDC", "decimals": 6 },
            { "chainId": 103, "address": "broken" }
        ]
    }"#;

    #[test]
    fn test_cluster_filter() {
        let devnet = TokenRegistry::from_token_list_json(LIST, Cluster::Devnet).unwrap();
        assert_eq!(devnet.len(), 1);
        let usdc = devnet.get("Gh9ZwEmdLJ8DscKNTkTqPbNwLNNBjuSzaG9Vp2KGtKJr").unwrap();
        assert_eq!(usdc.name, "USD Coin Dev");
        assert!(usdc.icon_url.is_none());

        let mainnet = TokenRegistry::from_token_list_json(LIST, Cluster::MainnetBeta).unwrap();
        assert_eq!(
            mainnet
                .get("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v")
                .and_then(|m| m.icon_url.as_deref()),
            Some("https://example.com/usdc.png")
        );
        assert!(TokenRegistry::from_token_list_json(LIST, Cluster::Testnet)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_invalid_document() {
        assert!(TokenRegistry::from_token_list_json("[]", Cluster::Devnet).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, LIST).unwrap();
        assert_eq!(TokenRegistry::from_file(&path, Cluster::Devnet).unwrap().len(), 1);
        assert!(TokenRegistry::from_file(dir.path().join("missing.json"), Cluster::Devnet).is_err());
    }

    #[test]
    fn test_cluster_parsing() {
        assert_eq!("devnet".parse::<Cluster>().unwrap(), Cluster::Devnet);
        assert_eq!("101".parse::<Cluster>().unwrap(), Cluster::MainnetBeta);
        assert!("localnet".parse::<Cluster>().is_err());
        assert_eq!(Cluster::MainnetBeta.to_string(), "mainnet-beta");
    }
}
