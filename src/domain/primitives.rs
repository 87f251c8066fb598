//! Domain primitives: wei amounts and account addresses.

use crate::error::FixtureError;
use alloy::primitives::{Address, U256};
use std::str::FromStr;

/// Smallest-unit scale of the native currency (18 decimals).
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Whole native-currency units expressed in wei.
pub fn ether(units: u64) -> U256 {
    U256::from(units) * U256::from(WEI_PER_ETHER)
}

/// Parse a hex account address, accepting any letter case.
///
/// Addresses are byte values, so mixed-case (checksummed) input and its
/// lowercase form resolve to the same account.
pub fn parse_address(raw: &str) -> Result<Address, FixtureError> {
    let lowered = raw.trim().to_lowercase();
    if !lowered.starts_with("0x") || lowered.len() != 42 {
        return Err(FixtureError::InvalidAddress(raw.to_string()));
    }
    Address::from_str(&lowered).map_err(|_| FixtureError::InvalidAddress(raw.to_string()))
}

/// Lowercase `0x`-prefixed rendering used on the wire.
pub fn format_address(address: &Address) -> String {
    format!("{:#x}", address)
}
