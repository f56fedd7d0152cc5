//! Shared types for Plutus Core
//!
//! All data structures that cross module boundaries are defined here
//! for consistent serialization and FFI compatibility.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

use crate::error::{PlutusError, PlutusResult};
use crate::wallet::{DerivationPath, RecoveryPhrase};

// =============================================================================
// Chain Types
// =============================================================================

/// Supported chain families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Chain {
    /// Ed25519 keys, base58 encoding
    Solana,
    /// secp256k1 keys, EIP-55 addresses
    Ethereum,
}

impl Chain {
    pub fn all() -> [Chain; 2] {
        [Chain::Solana, Chain::Ethereum]
    }

    /// SLIP-0044 coin type used in the derivation path
    pub fn coin_type(&self) -> u32 {
        match self {
            Chain::Solana => 501,
            Chain::Ethereum => 60,
        }
    }

    /// Exponent between the smallest unit and the display unit
    pub fn decimals(&self) -> u32 {
        match self {
            Chain::Solana => 9,
            Chain::Ethereum => 18,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Chain::Solana => "SOL",
            Chain::Ethereum => "ETH",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Chain::Solana => "Solana",
            Chain::Ethereum => "Ethereum",
        }
    }

    pub fn icon_url(&self) -> &'static str {
        match self {
            Chain::Solana => "https://raw.githubusercontent.com/solana-labs/token-list/main/assets/mainnet/So11111111111111111111111111111111111111112/logo.png",
            Chain::Ethereum => "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains/ethereum/info/logo.png",
        }
    }

    /// Tag stored under the chain-selection key
    pub fn path_tag(&self) -> &'static str {
        match self {
            Chain::Solana => "501",
            Chain::Ethereum => "60",
        }
    }

    /// Parse a chain from either its name or its coin-type tag
    pub fn from_tag(tag: &str) -> PlutusResult<Chain> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "solana" | "sol" | "501" => Ok(Chain::Solana),
            "ethereum" | "eth" | "60" => Ok(Chain::Ethereum),
            other => Err(PlutusError::unsupported_chain(format!(
                "Unsupported chain tag: {}",
                other
            ))),
        }
    }

    pub fn from_coin_type(coin_type: u32) -> PlutusResult<Chain> {
        Chain::all()
            .into_iter()
            .find(|c| c.coin_type() == coin_type)
            .ok_or_else(|| {
                PlutusError::unsupported_chain(format!("Unsupported coin type: {}", coin_type))
            })
    }
}

impl FromStr for Chain {
    type Err = PlutusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::from_tag(s)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::Solana => write!(f, "solana"),
            Chain::Ethereum => write!(f, "ethereum"),
        }
    }
}

// =============================================================================
// Account Types
// =============================================================================

/// A derived account held by the wallet
///
/// Not `Serialize`: only `to_stored` reaches storage.
#[derive(Clone)]
pub struct Account {
    /// Chain-native address (base58 or checksummed hex)
    pub public_key: String,
    /// Chain-native secret encoding (base58 keypair or hex)
    pub private_key: String,
    /// Phrase the account was derived from
    pub mnemonic: RecoveryPhrase,
    pub path: DerivationPath,
    pub chain: Chain,
    /// Native balance in display units
    pub balance: Decimal,
}

impl Account {
    pub fn account_index(&self) -> u32 {
        self.path.account_index()
    }

    /// Persisted form: everything re-derivable from the phrase is left out
    pub fn to_stored(&self) -> StoredAccount {
        StoredAccount {
            public_key: self.public_key.clone(),
            path: self.path.clone(),
            chain: self.chain,
            balance: self.balance,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .field("path", &self.path.to_string())
            .field("chain", &self.chain)
            .field("balance", &self.balance)
            .finish()
    }
}

impl Drop for Account {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// Account record as written to storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccount {
    pub public_key: String,
    pub path: DerivationPath,
    #[serde(rename = "blockchain")]
    pub chain: Chain,
    #[serde(default)]
    pub balance: Decimal,
}

// =============================================================================
// Portfolio Types
// =============================================================================

/// Display metadata for a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub icon_url: Option<String>,
    pub decimals: Option<u8>,
}

impl TokenMetadata {
    pub const UNKNOWN: &'static str = "Unknown";

    pub fn unknown() -> Self {
        Self {
            name: Self::UNKNOWN.to_string(),
            symbol: Self::UNKNOWN.to_string(),
            icon_url: None,
            decimals: None,
        }
    }
}

/// One fungible asset held by a wallet, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolding {
    /// Mint id; the wallet address for the native holding
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Amount in display units
    pub amount: Decimal,
    pub icon_url: Option<String>,
    #[serde(default)]
    pub is_native: bool,
}

/// How a snapshot was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshKind {
    Full,
    Incremental,
}

/// Result of a portfolio fetch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub owner: String,
    /// Native holding first, then tokens in ledger order
    pub holdings: Vec<TokenHolding>,
    pub kind: RefreshKind,
    /// Non-fatal metadata failure; affected holdings carry the Unknown fallback
    pub metadata_error: Option<PlutusError>,
}

// =============================================================================
// API Response Types
// =============================================================================

/// Envelope for every FFI response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<PlutusError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: PlutusError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"code":"internal","message":"Serialization failed"}}"#.to_string()
        })
    }
}
