//! Ledger Collaborator
//!
//! Native balances for both chains and SPL token accounts for Solana.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::error::{PlutusError, PlutusResult};
use crate::log_warn;
use crate::types::Chain;
use crate::utils::build_client;

use super::rpc::RpcClient;
use super::DecodeError;

/// SPL token program
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Size of an SPL token account
pub const TOKEN_ACCOUNT_SIZE: u64 = 165;

/// Byte offset of the owner field inside a token account
pub const TOKEN_OWNER_OFFSET: u64 = 32;

/// Remote ledger queries
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Native balance in the chain's smallest unit
    async fn native_balance(&self, chain: Chain, address: &str) -> PlutusResult<u128>;

    /// Token accounts owned by `owner`, in ledger order
    async fn token_accounts(&self, chain: Chain, owner: &str)
        -> PlutusResult<Vec<ParsedTokenAccount>>;
}

/// Validated SPL token account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTokenAccount {
    pub pubkey: String,
    pub mint: String,
    pub owner: String,
    pub raw_amount: u64,
    pub decimals: u8,
}

// Wire shape of one `getProgramAccounts` entry under `jsonParsed`

#[derive(Deserialize)]
struct KeyedAccount {
    pubkey: String,
    account: AccountEnvelope,
}

#[derive(Deserialize)]
struct AccountEnvelope {
    data: ParsedData,
}

#[derive(Deserialize)]
struct ParsedData {
    program: String,
    parsed: ParsedPayload,
}

#[derive(Deserialize)]
struct ParsedPayload {
    #[serde(rename = "type")]
    kind: String,
    info: TokenAccountInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    mint: String,
    owner: String,
    token_amount: TokenAmount,
}

#[derive(Deserialize)]
struct TokenAmount {
    amount: String,
    decimals: u8,
}

impl ParsedTokenAccount {
    /// Decode one `jsonParsed` program-account entry
    pub fn decode(entry: Value) -> Result<Self, DecodeError> {
        let keyed: KeyedAccount =
            serde_json::from_value(entry).map_err(|e| DecodeError::Json(e.to_string()))?;

        let data = keyed.account.data;
        if data.program != "spl-token" {
            return Err(DecodeError::UnexpectedProgram(data.program));
        }
        if data.parsed.kind != "account" {
            return Err(DecodeError::UnexpectedType(data.parsed.kind));
        }

        let info = data.parsed.info;
        require_pubkey("pubkey", &keyed.pubkey)?;
        require_pubkey("mint", &info.mint)?;
        require_pubkey("owner", &info.owner)?;

        let raw_amount = info
            .token_amount
            .amount
            .parse::<u64>()
            .map_err(|_| DecodeError::InvalidAmount(info.token_amount.amount.clone()))?;

        Ok(Self {
            pubkey: keyed.pubkey,
            mint: info.mint,
            owner: info.owner,
            raw_amount,
            decimals: info.token_amount.decimals,
        })
    }
}

fn require_pubkey(field: &'static str, value: &str) -> Result<(), DecodeError> {
    match bs58::decode(value).into_vec() {
        Ok(bytes) if bytes.len() == 32 => Ok(()),
        _ => Err(DecodeError::MalformedField(field)),
    }
}

/// JSON-RPC backed ledger: Solana RPC and an EVM RPC
pub struct RpcLedger {
    solana: RpcClient,
    ethereum: RpcClient,
}

#[derive(Deserialize)]
struct ContextValue<T> {
    value: T,
}

impl RpcLedger {
    pub fn new(config: &EngineConfig) -> PlutusResult<Self> {
        let client = build_client(config.request_timeout())?;
        Ok(Self {
            solana: RpcClient::with_client(client.clone(), config.rpc_url(Chain::Solana)),
            ethereum: RpcClient::with_client(client, config.rpc_url(Chain::Ethereum)),
        })
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn native_balance(&self, chain: Chain, address: &str) -> PlutusResult<u128> {
        match chain {
            Chain::Solana => {
                let method = "getBalance";
                let result: ContextValue<u64> = self
                    .solana
                    .call(method, json!([address, { "commitment": "confirmed" }]))
                    .await
                    .map_err(|e| self.solana.ledger_error(method, e))?;
                Ok(u128::from(result.value))
            }
            Chain::Ethereum => {
                let method = "eth_getBalance";
                let hex_balance: String = self
                    .ethereum
                    .call(method, json!([address, "latest"]))
                    .await
                    .map_err(|e| self.ethereum.ledger_error(method, e))?;
                parse_hex_quantity(&hex_balance)
            }
        }
    }

    async fn token_accounts(
        &self,
        chain: Chain,
        owner: &str,
    ) -> PlutusResult<Vec<ParsedTokenAccount>> {
        if chain != Chain::Solana {
            return Err(PlutusError::unsupported_chain(format!(
                "Token portfolios are not available for {}",
                chain
            )));
        }

        let method = "getProgramAccounts";
        let params = json!([
            TOKEN_PROGRAM_ID,
            {
                "encoding": "jsonParsed",
                "filters": [
                    { "dataSize": TOKEN_ACCOUNT_SIZE },
                    { "memcmp": { "offset": TOKEN_OWNER_OFFSET, "bytes": owner } }
                ]
            }
        ]);

        let entries: Vec<Value> = self
            .solana
            .call(method, params)
            .await
            .map_err(|e| self.solana.ledger_error(method, e))?;

        Ok(decode_owned_accounts(entries, owner))
    }
}

/// Decode entries, skipping malformed records and foreign owners
pub fn decode_owned_accounts(entries: Vec<Value>, owner: &str) -> Vec<ParsedTokenAccount> {
    let mut accounts = Vec::with_capacity(entries.len());

    for entry in entries {
        match ParsedTokenAccount::decode(entry) {
            Ok(account) if account.owner == owner => accounts.push(account),
            Ok(account) => {
                log_warn!(
                    "ledger",
                    "Skipping token account with foreign owner",
                    account = account.pubkey,
                    owner = account.owner
                );
            }
            Err(e) => {
                log_warn!("ledger", "Skipping malformed token account", error = e);
            }
        }
    }

    accounts
}

/// Parse an EVM hex quantity such as `0x1bc16d674ec80000`
pub fn parse_hex_quantity(hex_value: &str) -> PlutusResult<u128> {
    let digits = hex_value
        .strip_prefix("0x")
        .ok_or_else(|| PlutusError::decode(format!("Quantity lacks 0x prefix: {}", hex_value)))?;

    if digits.is_empty() {
        return Err(PlutusError::decode("Empty hex quantity"));
    }

    u128::from_str_radix(digits, 16)
        .map_err(|_| PlutusError::decode(format!("Invalid hex quantity: {}", hex_value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk";
    const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const ACCOUNT: &str = "GKreMsHvt8A79VApjboYDq3J4ZCXSJRYYQk9BscMbi1H";

    fn entry(owner: &str, amount: &str) -> Value {
        json!({
            "pubkey": ACCOUNT,
            "account": {
                "lamports": 2039280,
                "owner": TOKEN_PROGRAM_ID,
                "data": {
                    "program": "spl-token",
                    "space": 165,
                    "parsed": {
                        "type": "account",
                        "info": {
                            "mint": MINT,
                            "owner": owner,
                            "state": "initialized",
                            "tokenAmount": { "amount": amount, "decimals": 6, "uiAmount": 1.5 }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_decode_valid_entry() {
        let account = ParsedTokenAccount::decode(entry(OWNER, "1500000")).unwrap();
        assert_eq!(account.mint, MINT);
        assert_eq!(account.owner, OWNER);
        assert_eq!(account.raw_amount, 1_500_000);
        assert_eq!(account.decimals, 6);
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        let mut bad = entry(OWNER, "1");
        bad["account"]["data"]["program"] = json!("spl-token-2022");
        assert!(matches!(
            ParsedTokenAccount::decode(bad),
            Err(DecodeError::UnexpectedProgram(_))
        ));

        let mut bad = entry(OWNER, "1");
        bad["account"]["data"]["parsed"]["type"] = json!("mint");
        assert!(matches!(
            ParsedTokenAccount::decode(bad),
            Err(DecodeError::UnexpectedType(_))
        ));

        assert!(matches!(
            ParsedTokenAccount::decode(entry(OWNER, "-5")),
            Err(DecodeError::InvalidAmount(_))
        ));

        assert!(matches!(
            ParsedTokenAccount::decode(entry("not-base58!", "1")),
            Err(DecodeError::MalformedField("owner"))
        ));

        assert!(matches!(
            ParsedTokenAccount::decode(json!({ "pubkey": ACCOUNT })),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_decode_owned_accounts_skips_bad_records() {
        let entries = vec![
            entry(OWNER, "10"),
            json!({ "garbage": true }),
            entry(ACCOUNT, "20"),
            entry(OWNER, "30"),
        ];
        let accounts = decode_owned_accounts(entries, OWNER);
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].raw_amount, 10);
        assert_eq!(accounts[1].raw_amount, 30);
    }

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x0").unwrap(), 0);
        assert_eq!(
            parse_hex_quantity("0x1bc16d674ec80000").unwrap(),
            2_000_000_000_000_000_000
        );
        assert!(parse_hex_quantity("1bc1").is_err());
        assert!(parse_hex_quantity("0x").is_err());
        assert!(parse_hex_quantity("0xzz").is_err());
    }
}
