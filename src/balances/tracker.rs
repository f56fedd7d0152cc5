//! Balance Tracker
//!
//! One Tokio task per tracked account. Each task ticks on a fixed interval
//! and awaits its poll inside the loop, so polls for one account never
//! overlap. Untracking fires the task's cancel signal; an update already
//! queued from that task is discarded by its generation number. A task
//! compares each poll with its baseline, which the owner can reset with
//! `resync` when a reported change was not applied.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::api::LedgerClient;
use crate::config::DEFAULT_POLL_INTERVAL_MS;
use crate::error::{PlutusError, PlutusResult};
use crate::types::{Account, Chain};
use crate::{log_debug, log_warn};

use super::sync::{poll, reconcile};

/// A changed balance reported by a poll task
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceUpdate {
    pub public_key: String,
    pub chain: Chain,
    pub balance: Decimal,
    pub generation: u64,
}

struct TrackedAccount {
    generation: u64,
    baseline: watch::Sender<Decimal>,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TrackedAccount {
    fn stop(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.handle.abort();
    }
}

pub struct BalanceTracker {
    ledger: Arc<dyn LedgerClient>,
    period: Duration,
    tracked: HashMap<String, TrackedAccount>,
    next_generation: u64,
    updates_tx: mpsc::UnboundedSender<BalanceUpdate>,
    updates_rx: mpsc::UnboundedReceiver<BalanceUpdate>,
}

impl BalanceTracker {
    pub fn new(ledger: Arc<dyn LedgerClient>, period: Duration) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            ledger,
            period,
            tracked: HashMap::new(),
            next_generation: 0,
            updates_tx,
            updates_rx,
        }
    }

    pub fn with_default_interval(ledger: Arc<dyn LedgerClient>) -> Self {
        Self::new(ledger, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Start polling an account; restarts the loop if it is already tracked
    ///
    /// Must be called from within a Tokio runtime.
    pub fn track(&mut self, account: &Account) -> PlutusResult<()> {
        self.track_address(account.chain, &account.public_key, account.balance)
    }

    /// Same as `track` for a bare address and its last known balance
    pub fn track_address(
        &mut self,
        chain: Chain,
        public_key: &str,
        known_balance: Decimal,
    ) -> PlutusResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| PlutusError::internal("Balance tracking requires a Tokio runtime"))?;

        self.untrack(public_key);

        self.next_generation += 1;
        let generation = self.next_generation;
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (baseline_tx, baseline_rx) = watch::channel(known_balance);

        let task = PollTask {
            ledger: self.ledger.clone(),
            chain,
            public_key: public_key.to_string(),
            generation,
            period: self.period,
            last: known_balance,
            baseline: baseline_rx,
            updates: self.updates_tx.clone(),
        };
        let handle = runtime.spawn(task.run(cancel_rx));

        self.tracked.insert(
            public_key.to_string(),
            TrackedAccount {
                generation,
                baseline: baseline_tx,
                cancel: Some(cancel_tx),
                handle,
            },
        );

        log_debug!("balances", "Tracking account", public_key = public_key, generation = generation);
        Ok(())
    }

    /// Stop polling an account; returns whether it was tracked
    pub fn untrack(&mut self, public_key: &str) -> bool {
        match self.tracked.remove(public_key) {
            Some(tracked) => {
                tracked.stop();
                true
            }
            None => false,
        }
    }

    /// Reset the balance a task compares against, so a change it already
    /// reported is reported again on the next tick
    ///
    /// Returns whether the account is tracked.
    pub fn resync(&mut self, public_key: &str, balance: Decimal) -> bool {
        match self.tracked.get(public_key) {
            Some(tracked) => {
                tracked.baseline.send_replace(balance);
                true
            }
            None => false,
        }
    }

    pub fn untrack_all(&mut self) {
        for (_, tracked) in self.tracked.drain() {
            tracked.stop();
        }
    }

    pub fn is_tracked(&self, public_key: &str) -> bool {
        self.tracked.contains_key(public_key)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    fn is_current(&self, update: &BalanceUpdate) -> bool {
        self.tracked
            .get(&update.public_key)
            .is_some_and(|t| t.generation == update.generation)
    }

    /// Wait for the next update from a live task
    ///
    /// Returns `None` once nothing is tracked.
    pub async fn next_update(&mut self) -> Option<BalanceUpdate> {
        loop {
            if self.tracked.is_empty() {
                while self.updates_rx.try_recv().is_ok() {}
                return None;
            }

            let update = self.updates_rx.recv().await?;
            if self.is_current(&update) {
                return Some(update);
            }
            log_debug!("balances", "Dropping stale update", public_key = update.public_key);
        }
    }

    /// Next queued update from a live task, without waiting
    pub fn try_next_update(&mut self) -> Option<BalanceUpdate> {
        while let Ok(update) = self.updates_rx.try_recv() {
            if self.is_current(&update) {
                return Some(update);
            }
        }
        None
    }
}

impl Drop for BalanceTracker {
    fn drop(&mut self) {
        self.untrack_all();
    }
}

struct PollTask {
    ledger: Arc<dyn LedgerClient>,
    chain: Chain,
    public_key: String,
    generation: u64,
    period: Duration,
    last: Decimal,
    baseline: watch::Receiver<Decimal>,
    updates: mpsc::UnboundedSender<BalanceUpdate>,
}

impl PollTask {
    async fn run(mut self, mut cancel: oneshot::Receiver<()>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => break,
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = &mut cancel => break,
                result = poll(self.ledger.as_ref(), self.chain, &self.public_key) => result,
            };

            if self.baseline.has_changed().unwrap_or(false) {
                self.last = *self.baseline.borrow_and_update();
            }

            match fetched {
                Ok(balance) => {
                    if let Some(changed) = reconcile(self.last, balance) {
                        self.last = changed;
                        let update = BalanceUpdate {
                            public_key: self.public_key.clone(),
                            chain: self.chain,
                            balance: changed,
                            generation: self.generation,
                        };
                        if self.updates.send(update).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    log_warn!(
                        "balances",
                        "Balance poll failed, retrying next tick",
                        public_key = self.public_key,
                        error = e
                    );
                }
            }
        }
    }
}
