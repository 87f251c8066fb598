//! Contract addresses of the 0x v2 deployment on the local development network.

use crate::error::FixtureError;
use alloy::primitives::{address, Address};

/// Network id of the local development node snapshot.
pub const LOCAL_NETWORK_ID: u64 = 50;

/// Contracts the fixtures touch on one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkAddresses {
    pub exchange: Address,
    pub erc20_proxy: Address,
    /// Wrapped native currency (WETH9).
    pub ether_token: Address,
    pub zrx_token: Address,
}

impl NetworkAddresses {
    pub fn for_network(network_id: u64) -> Result<Self, FixtureError> {
        match network_id {
            LOCAL_NETWORK_ID => Ok(Self {
                exchange: address!("0x48bacb9266a570d521063ef5dd96e61686dbe788"),
                erc20_proxy: address!("0x1dc4c1cefef38a777b15aa20260a54e584b16c48"),
                ether_token: address!("0x0b1ba0af832d7c05fd64161e0db78e85978e8082"),
                zrx_token: address!("0x871dd7c2b4b25e1aa18728e9d5f2af4c4e431f5c"),
            }),
            other => Err(FixtureError::UnknownNetwork(other)),
        }
    }
}
