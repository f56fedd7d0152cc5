//! Portfolio Aggregator
//!
//! Builds the display list for one wallet: the native holding first, then
//! one holding per mint in ledger order. Metadata resolves registry first,
//! then one batched off-chain lookup for the misses, then "Unknown".

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::api::{LedgerClient, MetadataClient, ParsedTokenAccount, MAX_BATCH_SIZE};
use crate::error::{ErrorCode, PlutusError, PlutusResult};
use crate::types::{Chain, PortfolioSnapshot, RefreshKind, TokenHolding, TokenMetadata};
use crate::utils::from_base_units;
use crate::wallet::validate_address;
use crate::{log_info, log_warn};

use super::registry::TokenRegistry;

/// Token accounts of one mint, summed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintBalance {
    pub mint: String,
    pub raw_amount: u128,
    pub decimals: u8,
}

/// Collapse token accounts into one entry per mint, keeping first-seen order
pub fn merge_by_mint(accounts: &[ParsedTokenAccount]) -> PlutusResult<Vec<MintBalance>> {
    let mut merged: Vec<MintBalance> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for account in accounts {
        match positions.get(account.mint.as_str()) {
            Some(&i) => {
                let entry = &mut merged[i];
                if entry.decimals != account.decimals {
                    log_warn!(
                        "portfolio",
                        "Token accounts disagree on decimals",
                        mint = account.mint,
                        kept = entry.decimals,
                        seen = account.decimals
                    );
                }
                entry.raw_amount = entry
                    .raw_amount
                    .checked_add(u128::from(account.raw_amount))
                    .ok_or_else(|| PlutusError::decode("Token amount overflow"))?;
            }
            None => {
                positions.insert(account.mint.as_str(), merged.len());
                merged.push(MintBalance {
                    mint: account.mint.clone(),
                    raw_amount: u128::from(account.raw_amount),
                    decimals: account.decimals,
                });
            }
        }
    }

    Ok(merged)
}

/// Holdings whose name, symbol or mint contains `query` (case-sensitive)
pub fn search<'a>(holdings: &'a [TokenHolding], query: &str) -> Vec<&'a TokenHolding> {
    holdings
        .iter()
        .filter(|h| {
            query.is_empty()
                || h.name.contains(query)
                || h.symbol.contains(query)
                || h.mint.contains(query)
        })
        .collect()
}

pub struct PortfolioAggregator {
    chain: Chain,
    ledger: Arc<dyn LedgerClient>,
    metadata: Arc<dyn MetadataClient>,
    registry: Arc<TokenRegistry>,
}

impl PortfolioAggregator {
    pub fn new(
        chain: Chain,
        ledger: Arc<dyn LedgerClient>,
        metadata: Arc<dyn MetadataClient>,
        registry: Arc<TokenRegistry>,
    ) -> Self {
        Self {
            chain,
            ledger,
            metadata,
            registry,
        }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Full refresh: amounts and metadata for every holding
    pub async fn fetch_all(&self, owner: &str) -> PlutusResult<PortfolioSnapshot> {
        let (merged, native_raw) = self.query_ledger(owner).await?;
        self.build_full(owner, merged, native_raw).await
    }

    /// Amount-only refresh of a previous snapshot
    ///
    /// Falls back to a full refresh when the set of mints changed.
    pub async fn refresh_amounts(
        &self,
        owner: &str,
        existing: &[TokenHolding],
    ) -> PlutusResult<PortfolioSnapshot> {
        let (merged, native_raw) = self.query_ledger(owner).await?;

        if !same_mint_set(owner, existing, &merged) {
            log_info!(
                "portfolio",
                "Token set changed, running full refresh",
                owner = owner,
                known = existing.iter().filter(|h| !h.is_native).count(),
                on_chain = merged.len()
            );
            return self.build_full(owner, merged, native_raw).await;
        }

        let by_mint: HashMap<&str, &MintBalance> =
            merged.iter().map(|m| (m.mint.as_str(), m)).collect();

        let mut holdings = existing.to_vec();
        for holding in holdings.iter_mut() {
            if holding.is_native {
                holding.amount = from_base_units(native_raw, self.chain.decimals())?;
            } else if let Some(balance) = by_mint.get(holding.mint.as_str()) {
                // Keeps the previous amount when the new one cannot be represented
                if let Some(amount) = token_amount(balance) {
                    holding.decimals = balance.decimals;
                    holding.amount = amount;
                }
            }
        }

        Ok(PortfolioSnapshot {
            owner: owner.to_string(),
            holdings,
            kind: RefreshKind::Incremental,
            metadata_error: None,
        })
    }

    async fn query_ledger(&self, owner: &str) -> PlutusResult<(Vec<MintBalance>, u128)> {
        if !validate_address(owner, self.chain).0 {
            return Err(PlutusError::ledger(format!(
                "Cannot query an invalid {} address",
                self.chain
            )));
        }

        let (accounts, native_raw) = tokio::try_join!(
            self.ledger.token_accounts(self.chain, owner),
            self.ledger.native_balance(self.chain, owner),
        )?;

        Ok((merge_by_mint(&accounts)?, native_raw))
    }

    async fn build_full(
        &self,
        owner: &str,
        merged: Vec<MintBalance>,
        native_raw: u128,
    ) -> PlutusResult<PortfolioSnapshot> {
        let (mut resolved, metadata_error) = self.resolve_metadata(&merged).await;

        let mut holdings = Vec::with_capacity(merged.len() + 1);
        holdings.push(self.native_holding(owner, native_raw)?);

        for balance in merged {
            let Some(amount) = token_amount(&balance) else {
                continue;
            };
            let metadata = resolved
                .remove(&balance.mint)
                .unwrap_or_else(TokenMetadata::unknown);
            holdings.push(TokenHolding {
                amount,
                mint: balance.mint,
                name: metadata.name,
                symbol: metadata.symbol,
                decimals: balance.decimals,
                icon_url: metadata.icon_url,
                is_native: false,
            });
        }

        Ok(PortfolioSnapshot {
            owner: owner.to_string(),
            holdings,
            kind: RefreshKind::Full,
            metadata_error,
        })
    }

    /// Registry hits, then batched lookups for the rest
    ///
    /// A failed batch leaves its mints unresolved; other batches still count.
    async fn resolve_metadata(
        &self,
        merged: &[MintBalance],
    ) -> (HashMap<String, TokenMetadata>, Option<PlutusError>) {
        let mut resolved = HashMap::with_capacity(merged.len());
        let mut misses = Vec::new();

        for balance in merged {
            match self.registry.get(&balance.mint) {
                Some(metadata) => {
                    resolved.insert(balance.mint.clone(), metadata.clone());
                }
                None => misses.push(balance.mint.clone()),
            }
        }

        if misses.is_empty() {
            return (resolved, None);
        }

        let mut first_error = None;
        for chunk in misses.chunks(MAX_BATCH_SIZE) {
            match self.metadata.fetch_batch(chunk).await {
                Ok(found) => {
                    let wanted: HashSet<&String> = chunk.iter().collect();
                    resolved.extend(found.into_iter().filter(|(mint, _)| wanted.contains(mint)));
                }
                Err(mut e) => {
                    log_warn!(
                        "portfolio",
                        "Metadata lookup failed, using fallback names",
                        mints = chunk.len(),
                        error = e
                    );
                    e.code = ErrorCode::MetadataFetchError;
                    first_error.get_or_insert(e);
                }
            }
        }

        (resolved, first_error)
    }

    fn native_holding(&self, owner: &str, raw: u128) -> PlutusResult<TokenHolding> {
        Ok(TokenHolding {
            mint: owner.to_string(),
            name: self.chain.display_name().to_string(),
            symbol: self.chain.symbol().to_string(),
            decimals: self.chain.decimals() as u8,
            amount: from_base_units(raw, self.chain.decimals())?,
            icon_url: Some(self.chain.icon_url().to_string()),
            is_native: true,
        })
    }
}

/// Display amount of one mint; `None` (logged) when it is out of range
fn token_amount(balance: &MintBalance) -> Option<Decimal> {
    match from_base_units(balance.raw_amount, u32::from(balance.decimals)) {
        Ok(amount) => Some(amount),
        Err(e) => {
            log_warn!(
                "portfolio",
                "Skipping token amount",
                mint = balance.mint,
                decimals = balance.decimals,
                error = e
            );
            None
        }
    }
}

/// Whether `existing` covers exactly the on-chain mints and leads with the native holding
fn same_mint_set(owner: &str, existing: &[TokenHolding], merged: &[MintBalance]) -> bool {
    let has_native = existing
        .first()
        .is_some_and(|h| h.is_native && h.mint == owner);
    if !has_native {
        return false;
    }

    let known: HashSet<&str> = existing
        .iter()
        .filter(|h| !h.is_native)
        .map(|h| h.mint.as_str())
        .collect();
    let token_count = existing.iter().filter(|h| !h.is_native).count();

    token_count == merged.len()
        && known.len() == merged.len()
        && merged.iter().all(|m| known.contains(m.mint.as_str()))
}
