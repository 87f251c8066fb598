use crate::config::Config;
use crate::error::FixtureError;
use crate::prompt::change_network_message;
use crate::transport::Chain;
use alloy::primitives::{Address, U256};

/// 3 × 10^18 wei.
pub const SUFFICIENT_BALANCE_WEI: U256 = U256::from_limbs([3_000_000_000_000_000_000, 0, 0, 0]);

/// Whether `address` holds at least [`SUFFICIENT_BALANCE_WEI`].
pub async fn has_sufficient_balance<C: Chain + ?Sized>(
    chain: &C,
    address: Address,
) -> Result<bool, FixtureError> {
    let balance = chain.get_balance(address).await?;
    Ok(balance >= SUFFICIENT_BALANCE_WEI)
}

/// Whether fixture seeding is switched on (`LOCAL_NODE`).
pub fn should_seed_fixtures(config: &Config) -> bool {
    config.seed_fixtures
}

/// Prompt asking the user to switch to `expected_network_id`, or `None`
/// when the node already reports it.
pub async fn network_mismatch_message<C: Chain + ?Sized>(
    chain: &C,
    expected_network_id: u64,
) -> Result<Option<String>, FixtureError> {
    let remote = chain.network_version().await?;
    if remote == expected_network_id {
        return Ok(None);
    }
    Ok(Some(change_network_message(expected_network_id)))
}
