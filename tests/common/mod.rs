//! Shared fakes for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use plutus_core::api::{LedgerClient, MetadataClient, ParsedTokenAccount};
use plutus_core::store::{BatchWrite, KeyValueStore, MemoryStore};
use plutus_core::{Chain, PlutusError, PlutusResult, TokenMetadata};

pub const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const SOL_OWNER: &str = "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk";

pub fn token_account(mint: &str, raw_amount: u64, decimals: u8) -> ParsedTokenAccount {
    ParsedTokenAccount {
        pubkey: format!("{}-{}", mint, raw_amount),
        mint: mint.to_string(),
        owner: SOL_OWNER.to_string(),
        raw_amount,
        decimals,
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Ledger whose answers the test edits between calls
#[derive(Default)]
pub struct ScriptedLedger {
    pub native: Mutex<u128>,
    pub accounts: Mutex<Vec<ParsedTokenAccount>>,
    pub fail: AtomicBool,
    pub token_calls: AtomicUsize,
}

impl ScriptedLedger {
    pub fn new(native: u128, accounts: Vec<ParsedTokenAccount>) -> Self {
        Self {
            native: Mutex::new(native),
            accounts: Mutex::new(accounts),
            ..Default::default()
        }
    }

    pub fn set_accounts(&self, accounts: Vec<ParsedTokenAccount>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    pub fn set_native(&self, native: u128) {
        *self.native.lock().unwrap() = native;
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn native_balance(&self, _chain: Chain, _address: &str) -> PlutusResult<u128> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlutusError::ledger("scripted failure"));
        }
        Ok(*self.native.lock().unwrap())
    }

    async fn token_accounts(
        &self,
        _chain: Chain,
        _owner: &str,
    ) -> PlutusResult<Vec<ParsedTokenAccount>> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlutusError::ledger("scripted failure"));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }
}

/// Slow ledger that records how many balance queries overlap
pub struct SlowLedger {
    pub delay: Duration,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicU64,
}

impl SlowLedger {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl LedgerClient for SlowLedger {
    async fn native_balance(&self, _chain: Chain, _address: &str) -> PlutusResult<u128> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(u128::from(self.calls.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn token_accounts(
        &self,
        _chain: Chain,
        _owner: &str,
    ) -> PlutusResult<Vec<ParsedTokenAccount>> {
        Ok(Vec::new())
    }
}

// =============================================================================
// Metadata
// =============================================================================

#[derive(Default)]
pub struct StaticMetadata {
    pub entries: HashMap<String, TokenMetadata>,
    /// Calls with this index or later fail
    pub fail_from_call: Option<usize>,
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<String>>,
}

impl StaticMetadata {
    pub fn with(entries: Vec<(&str, &str, &str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(mint, name, symbol)| {
                    (
                        mint.to_string(),
                        TokenMetadata {
                            name: name.to_string(),
                            symbol: symbol.to_string(),
                            icon_url: None,
                            decimals: None,
                        },
                    )
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_from_call: Some(0),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MetadataClient for StaticMetadata {
    async fn fetch_batch(&self, ids: &[String]) -> PlutusResult<HashMap<String, TokenMetadata>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().extend(ids.iter().cloned());
        if self.fail_from_call.is_some_and(|n| call >= n) {
            return Err(PlutusError::ledger("metadata service unreachable"));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.entries.get(id).map(|m| (id.clone(), m.clone())))
            .collect())
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Store that rejects writes while `fail` is set
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> PlutusResult<Option<String>> {
        self.inner.get(key)
    }

    fn write_batch(&self, writes: Vec<BatchWrite>) -> PlutusResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlutusError::persistence("disk full"));
        }
        self.inner.write_batch(writes)
    }
}
