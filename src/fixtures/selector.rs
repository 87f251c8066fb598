//! Funded-account selection.

use crate::domain::format_address;
use crate::error::FixtureError;
use crate::transport::Chain;
use alloy::primitives::{Address, U256};
use tracing::{debug, info};

/// Derivation index of the order maker account.
///
/// The maker is never picked as a funding source, so a fixture run cannot
/// spend from the same account it later signs orders with.
pub const MAKER_ACCOUNT_INDEX: usize = 0;

/// Return the highest-index account (excluding the maker) whose balance is
/// strictly greater than `minimum_balance`.
pub async fn select_funded_account<C: Chain + ?Sized>(
    chain: &C,
    minimum_balance: U256,
) -> Result<Address, FixtureError> {
    let addresses = chain.list_addresses().await?;

    for index in (MAKER_ACCOUNT_INDEX + 1..addresses.len()).rev() {
        let candidate = addresses[index];
        let balance = chain.get_balance(candidate).await?;
        debug!(
            "Account #{} {} holds {} wei",
            index,
            format_address(&candidate),
            balance
        );
        if balance > minimum_balance {
            info!(
                "Selected funded account #{} {}",
                index,
                format_address(&candidate)
            );
            return Ok(candidate);
        }
    }

    Err(FixtureError::InsufficientFunds {
        minimum: minimum_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockChain;

    fn wei(values: &[u64]) -> Vec<U256> {
        values.iter().map(|v| U256::from(*v)).collect()
    }

    #[tokio::test]
    async fn test_prefers_highest_index_over_first_match() {
        let mock = MockChain::with_accounts(5).with_balances(&wei(&[1, 2, 3, 0, 5]));
        let selected = select_funded_account(&mock, U256::from(2u64)).await.unwrap();
        assert_eq!(selected, mock.addresses()[4]);
    }

    #[tokio::test]
    async fn test_scans_downward_until_match() {
        let mock = MockChain::with_accounts(5).with_balances(&wei(&[1, 2, 3, 0, 1]));
        let selected = select_funded_account(&mock, U256::from(2u64)).await.unwrap();
        assert_eq!(selected, mock.addresses()[2]);
        let queried = mock.balance_queries();
        assert_eq!(
            queried,
            vec![mock.addresses()[4], mock.addresses()[3], mock.addresses()[2]]
        );
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let mock = MockChain::with_accounts(3).with_balances(&wei(&[0, 10, 10]));
        let result = select_funded_account(&mock, U256::from(10u64)).await;
        assert!(matches!(
            result,
            Err(FixtureError::InsufficientFunds { minimum }) if minimum == U256::from(10u64)
        ));
    }

    #[tokio::test]
    async fn test_maker_account_never_selected() {
        let mock = MockChain::with_accounts(4).with_balances(&wei(&[1_000, 0, 0, 0]));
        let result = select_funded_account(&mock, U256::from(1u64)).await;
        assert!(matches!(result, Err(FixtureError::InsufficientFunds { .. })));
        assert!(!mock.balance_queries().contains(&mock.addresses()[MAKER_ACCOUNT_INDEX]));
    }

    #[tokio::test]
    async fn test_empty_and_single_account_sets() {
        let empty = MockChain::with_accounts(0);
        assert!(matches!(
            select_funded_account(&empty, U256::ZERO).await,
            Err(FixtureError::InsufficientFunds { .. })
        ));

        let single = MockChain::with_accounts(1).with_balances(&wei(&[100]));
        assert!(matches!(
            select_funded_account(&single, U256::ZERO).await,
            Err(FixtureError::InsufficientFunds { .. })
        ));
    }

    #[tokio::test]
    async fn test_result_stays_within_derivable_set() {
        for limit in 1..=11usize {
            let balances: Vec<U256> = (0..limit).map(|i| U256::from((i * 7 % 5) as u64)).collect();
            let mock = MockChain::with_accounts(limit).with_balances(&balances);
            for threshold in 0..5u64 {
                match select_funded_account(&mock, U256::from(threshold)).await {
                    Ok(address) => {
                        let index = mock
                            .addresses()
                            .iter()
                            .position(|a| *a == address)
                            .expect("selected address must be derivable");
                        assert!(index > MAKER_ACCOUNT_INDEX);
                        assert!(balances[index] > U256::from(threshold));
                        assert!(balances[index + 1..]
                            .iter()
                            .all(|b| *b <= U256::from(threshold)));
                    }
                    Err(FixtureError::InsufficientFunds { .. }) => {
                        assert!(balances[1..].iter().all(|b| *b <= U256::from(threshold)));
                    }
                    Err(other) => panic!("unexpected error {:?}", other),
                }
            }
        }
    }
}
