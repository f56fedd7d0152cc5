//! One balance refresh step, free of scheduling concerns.

use rust_decimal::Decimal;

use crate::api::LedgerClient;
use crate::error::PlutusResult;
use crate::types::Chain;
use crate::utils::from_base_units;

/// Fetch the native balance of `address` in display units
pub async fn poll(ledger: &dyn LedgerClient, chain: Chain, address: &str) -> PlutusResult<Decimal> {
    let raw = ledger.native_balance(chain, address).await?;
    from_base_units(raw, chain.decimals())
}

/// The value to store, if it differs from what is stored
pub fn reconcile(stored: Decimal, fetched: Decimal) -> Option<Decimal> {
    (stored != fetched).then_some(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::api::ParsedTokenAccount;
    use crate::error::PlutusError;
    use std::str::FromStr;

    struct FixedLedger(PlutusResult<u128>);

    #[async_trait]
    impl LedgerClient for FixedLedger {
        async fn native_balance(&self, _chain: Chain, _address: &str) -> PlutusResult<u128> {
            self.0.clone()
        }

        async fn token_accounts(
            &self,
            _chain: Chain,
            _owner: &str,
        ) -> PlutusResult<Vec<ParsedTokenAccount>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_poll_converts_units() {
        let ledger = FixedLedger(Ok(2_500_000_000));
        let sol = poll(&ledger, Chain::Solana, "addr").await.unwrap();
        assert_eq!(sol, Decimal::from_str("2.5").unwrap());

        let ledger = FixedLedger(Ok(500_000_000_000_000_000));
        let eth = poll(&ledger, Chain::Ethereum, "0xabc").await.unwrap();
        assert_eq!(eth, Decimal::from_str("0.5").unwrap());
    }

    #[tokio::test]
    async fn test_poll_propagates_failure() {
        let ledger = FixedLedger(Err(PlutusError::ledger("timeout")));
        assert!(poll(&ledger, Chain::Solana, "addr").await.is_err());
    }

    #[test]
    fn test_reconcile() {
        let one = Decimal::ONE;
        assert_eq!(reconcile(one, one), None);
        assert_eq!(reconcile(Decimal::ZERO, one), Some(one));
        // Scale differences are not changes
        assert_eq!(reconcile(Decimal::from_str("1.0").unwrap(), one), None);
    }
}
