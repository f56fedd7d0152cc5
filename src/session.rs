//! Wallet Session
//!
//! Single owner of one wallet's AccountStore and BalanceTracker. Every
//! lifecycle call keeps the two in step: created accounts start polling,
//! deleted accounts stop polling before they leave the store, and a balance
//! update is only applied while its account is still tracked.

use std::sync::Arc;

use crate::api::LedgerClient;
use crate::balances::{BalanceTracker, BalanceUpdate};
use crate::config::EngineConfig;
use crate::error::{PlutusError, PlutusResult};
use crate::store::{AccountStore, KeyValueStore, WalletState};
use crate::types::{Account, Chain};
use crate::wallet::RecoveryPhrase;
use crate::{log_debug, log_warn};

pub struct WalletSession {
    store: AccountStore,
    tracker: BalanceTracker,
}

impl WalletSession {
    /// Load persisted state and start tracking every restored account
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(
        storage: Arc<dyn KeyValueStore>,
        ledger: Arc<dyn LedgerClient>,
        config: &EngineConfig,
    ) -> PlutusResult<Self> {
        let store = AccountStore::load(storage);
        let mut tracker = BalanceTracker::new(ledger, config.poll_interval());
        for account in store.accounts() {
            tracker.track(account)?;
        }
        Ok(Self { store, tracker })
    }

    pub fn state(&self) -> WalletState {
        self.store.state()
    }

    pub fn chain(&self) -> Option<Chain> {
        self.store.chain()
    }

    pub fn phrase(&self) -> Option<&RecoveryPhrase> {
        self.store.phrase()
    }

    pub fn accounts(&self) -> &[Account] {
        self.store.accounts()
    }

    pub fn account(&self, public_key: &str) -> Option<&Account> {
        self.store.account(public_key)
    }

    pub fn is_tracked(&self, public_key: &str) -> bool {
        self.tracker.is_tracked(public_key)
    }

    pub fn select_chain(&mut self, chain: Chain) -> PlutusResult<()> {
        self.store.select_chain(chain)
    }

    pub fn create_account(&mut self, user_phrase: Option<&str>) -> PlutusResult<&Account> {
        let public_key = self.store.create_account(user_phrase)?.public_key.clone();
        if let Some(account) = self.store.account(&public_key) {
            self.tracker.track(account)?;
        }
        self.store
            .account(&public_key)
            .ok_or_else(|| PlutusError::internal("Created account not found"))
    }

    pub fn delete_account(&mut self, public_key: &str) -> PlutusResult<()> {
        if self.store.account(public_key).is_none() {
            // Let the store report the unknown key
            return self.store.delete_account(public_key);
        }
        self.tracker.untrack(public_key);
        if let Err(e) = self.store.delete_account(public_key) {
            // Still present: resume polling
            if let Some(account) = self.store.account(public_key) {
                self.tracker.track(account)?;
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn reset(&mut self) -> PlutusResult<()> {
        self.tracker.untrack_all();
        self.store.reset()
    }

    /// Wait for the next balance change and apply it to the store
    ///
    /// Returns `None` once nothing is tracked.
    pub async fn next_balance_change(&mut self) -> Option<BalanceUpdate> {
        loop {
            let update = self.tracker.next_update().await?;
            if self.apply(&update) {
                return Some(update);
            }
        }
    }

    /// Apply every update already queued; returns how many changed the store
    pub fn apply_pending_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Some(update) = self.tracker.try_next_update() {
            if self.apply(&update) {
                applied += 1;
            }
        }
        applied
    }

    fn apply(&mut self, update: &BalanceUpdate) -> bool {
        match self.store.apply_balance(&update.public_key, update.balance) {
            Ok(changed) => changed,
            Err(e) => {
                log_warn!(
                    "session",
                    "Could not persist balance update",
                    public_key = update.public_key,
                    error = e
                );
                // Poll again against what the store still holds
                if let Some(account) = self.store.account(&update.public_key) {
                    self.tracker.resync(&update.public_key, account.balance);
                }
                false
            }
        }
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        log_debug!("session", "Closing wallet session", accounts = self.store.accounts().len());
        self.tracker.untrack_all();
    }
}
