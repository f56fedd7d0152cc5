//! Account Store
//!
//! Owns the derived accounts of one wallet, the phrase they come from and
//! the selected chain. The three are persisted together: every mutation
//! writes one atomic batch first and touches memory only once it succeeded.
//!
//! Lifecycle: `Empty` → `ChainSelected` → `Populated`. Deleting the last
//! account returns to `Empty` and forgets the phrase, so the next account
//! starts a new lineage instead of reusing index 0 of the old one.

mod persistence;

pub use persistence::*;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{PlutusError, PlutusResult};
use crate::types::{Account, Chain, StoredAccount};
use crate::wallet::{derive_at_path, generate_phrase, to_seed, RecoveryPhrase};
use crate::{log_info, log_warn};

/// Storage key for the recovery phrase (JSON array of words)
pub const PHRASE_KEY: &str = "mnemonics";
/// Storage key for the selected chain (coin-type tag)
pub const CHAIN_KEY: &str = "selectedPathType";
/// Storage key for the account list
pub const ACCOUNTS_KEY: &str = "accounts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletState {
    Empty,
    ChainSelected,
    Populated,
}

pub struct AccountStore {
    storage: Arc<dyn KeyValueStore>,
    phrase: Option<RecoveryPhrase>,
    chain: Option<Chain>,
    accounts: Vec<Account>,
}

impl AccountStore {
    /// Empty store over `storage`, ignoring anything already persisted
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            phrase: None,
            chain: None,
            accounts: Vec::new(),
        }
    }

    /// Rebuild state from storage; anything unusable yields an empty store
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        match Self::restore(storage.as_ref()) {
            Ok(Some((phrase, chain, accounts))) => {
                log_info!("store", "Wallet restored", chain = chain, accounts = accounts.len());
                Self {
                    storage,
                    phrase: Some(phrase),
                    chain: Some(chain),
                    accounts,
                }
            }
            Ok(None) => Self::new(storage),
            Err(e) => {
                log_warn!("store", "Discarding unusable wallet state", error = e);
                Self::new(storage)
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> WalletState {
        if !self.accounts.is_empty() {
            WalletState::Populated
        } else if self.chain.is_some() {
            WalletState::ChainSelected
        } else {
            WalletState::Empty
        }
    }

    pub fn chain(&self) -> Option<Chain> {
        self.chain
    }

    pub fn phrase(&self) -> Option<&RecoveryPhrase> {
        self.phrase.as_ref()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, public_key: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.public_key == public_key)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Choose the chain family for this wallet
    pub fn select_chain(&mut self, chain: Chain) -> PlutusResult<()> {
        match self.chain {
            Some(current) if !self.accounts.is_empty() && current != chain => {
                Err(PlutusError::invalid_state(format!(
                    "Wallet already holds {} accounts",
                    current
                ))
                .with_details(format!("requested: {}", chain)))
            }
            _ => {
                self.chain = Some(chain);
                Ok(())
            }
        }
    }

    /// Derive and persist the next account
    ///
    /// A supplied phrase must be valid, and must match the current phrase
    /// while accounts exist. Without one the current phrase is reused, or a
    /// new one is generated.
    pub fn create_account(&mut self, user_phrase: Option<&str>) -> PlutusResult<&Account> {
        let chain = self
            .chain
            .ok_or_else(|| PlutusError::invalid_state("Select a chain before creating an account"))?;

        let phrase = match (user_phrase, &self.phrase) {
            (Some(candidate), current) => {
                let parsed = RecoveryPhrase::parse(candidate)?;
                if let Some(current) = current {
                    if !self.accounts.is_empty() && *current != parsed {
                        return Err(PlutusError::invalid_state(
                            "Accounts already exist under a different recovery phrase",
                        ));
                    }
                }
                parsed
            }
            (None, Some(current)) => current.clone(),
            (None, None) => generate_phrase()?,
        };

        let index = self.next_index();
        let account = crate::wallet::derive_account(&phrase, chain, index)?;

        let mut stored: Vec<StoredAccount> = self.accounts.iter().map(Account::to_stored).collect();
        stored.push(account.to_stored());

        self.storage.write_batch(vec![
            (PHRASE_KEY.to_string(), Some(serde_json::to_string(&phrase)?)),
            (CHAIN_KEY.to_string(), Some(chain.path_tag().to_string())),
            (ACCOUNTS_KEY.to_string(), Some(serde_json::to_string(&stored)?)),
        ])?;

        log_info!(
            "store",
            "Account created",
            chain = chain,
            index = index,
            public_key = account.public_key
        );

        self.phrase = Some(phrase);
        self.accounts.push(account);
        self.accounts
            .last()
            .ok_or_else(|| PlutusError::internal("Account list empty after insert"))
    }

    /// Remove one account; removing the last one forgets the phrase and chain
    pub fn delete_account(&mut self, public_key: &str) -> PlutusResult<()> {
        let position = self
            .accounts
            .iter()
            .position(|a| a.public_key == public_key)
            .ok_or_else(|| PlutusError::invalid_state("No account with that public key"))?;

        let remaining: Vec<StoredAccount> = self
            .accounts
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, a)| a.to_stored())
            .collect();

        if remaining.is_empty() {
            self.storage.write_batch(clear_all())?;
            self.accounts.clear();
            self.phrase = None;
            self.chain = None;
        } else {
            self.storage.write_batch(vec![(
                ACCOUNTS_KEY.to_string(),
                Some(serde_json::to_string(&remaining)?),
            )])?;
            self.accounts.remove(position);
        }

        log_info!("store", "Account deleted", public_key = public_key);
        Ok(())
    }

    /// Forget everything; memory is cleared even if storage fails
    pub fn reset(&mut self) -> PlutusResult<()> {
        let result = self.storage.write_batch(clear_all());
        self.accounts.clear();
        self.phrase = None;
        self.chain = None;
        log_info!("store", "Wallet reset");
        result
    }

    /// Store a freshly polled balance; returns whether anything changed
    pub fn apply_balance(&mut self, public_key: &str, balance: Decimal) -> PlutusResult<bool> {
        let Some(position) = self.accounts.iter().position(|a| a.public_key == public_key) else {
            return Ok(false);
        };
        if self.accounts[position].balance == balance {
            return Ok(false);
        }

        let stored: Vec<StoredAccount> = self
            .accounts
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let mut record = a.to_stored();
                if i == position {
                    record.balance = balance;
                }
                record
            })
            .collect();

        self.storage.write_batch(vec![(
            ACCOUNTS_KEY.to_string(),
            Some(serde_json::to_string(&stored)?),
        )])?;

        self.accounts[position].balance = balance;
        Ok(true)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// One past the highest index in use, so indices stay unique after deletions
    fn next_index(&self) -> u32 {
        self.accounts
            .iter()
            .map(Account::account_index)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    fn restore(
        storage: &dyn KeyValueStore,
    ) -> PlutusResult<Option<(RecoveryPhrase, Chain, Vec<Account>)>> {
        let phrase_raw = storage.get(PHRASE_KEY)?;
        let chain_raw = storage.get(CHAIN_KEY)?;
        let accounts_raw = storage.get(ACCOUNTS_KEY)?;

        let stored: Vec<StoredAccount> = match accounts_raw.as_deref() {
            None => Vec::new(),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| PlutusError::persistence(format!("Unreadable account list: {}", e)))?,
        };

        if stored.is_empty() {
            if phrase_raw.is_some() || chain_raw.is_some() {
                log_warn!("store", "Ignoring phrase and chain without accounts");
            }
            return Ok(None);
        }

        let phrase = parse_stored_phrase(
            phrase_raw
                .as_deref()
                .ok_or_else(|| PlutusError::persistence("Accounts stored without a phrase"))?,
        )?;
        let chain = Chain::from_tag(
            chain_raw
                .as_deref()
                .ok_or_else(|| PlutusError::persistence("Accounts stored without a chain"))?
                .trim_matches('"'),
        )?;

        let seed = to_seed(&phrase)?;
        let mut seen = HashSet::new();
        let mut accounts = Vec::with_capacity(stored.len());

        for record in stored {
            if record.chain != chain || record.path.chain() != chain {
                return Err(PlutusError::persistence(format!(
                    "Account at {} does not belong to {}",
                    record.path, chain
                )));
            }
            if !seen.insert(record.path.account_index()) {
                return Err(PlutusError::persistence(format!(
                    "Duplicate account index at {}",
                    record.path
                )));
            }

            let keys = derive_at_path(&seed, &record.path)?;
            if keys.public_key != record.public_key {
                return Err(PlutusError::persistence(format!(
                    "Stored public key does not match {}",
                    record.path
                )));
            }

            accounts.push(Account {
                public_key: keys.public_key.clone(),
                private_key: keys.private_key.clone(),
                mnemonic: phrase.clone(),
                path: record.path,
                chain,
                balance: record.balance,
            });
        }

        Ok(Some((phrase, chain, accounts)))
    }
}

/// Accept a JSON word array or a plain space-separated phrase
fn parse_stored_phrase(raw: &str) -> PlutusResult<RecoveryPhrase> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(words) => RecoveryPhrase::try_from(words),
        Err(_) => RecoveryPhrase::parse(raw),
    }
}

fn clear_all() -> Vec<BatchWrite> {
    vec![
        (PHRASE_KEY.to_string(), None),
        (CHAIN_KEY.to_string(), None),
        (ACCOUNTS_KEY.to_string(), None),
    ]
}
