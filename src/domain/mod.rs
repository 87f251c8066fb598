//! Domain types for fixture generation.
//!
//! This module provides:
//! - Wei amounts and address normalization
//! - The contract registry of the local development network
//! - 0x v2 signed orders and their conversion into the consumer's order shape

pub mod network;
pub mod order;
pub mod primitives;

pub use network::{NetworkAddresses, LOCAL_NETWORK_ID};
pub use order::{
    decode_erc20_asset_data, encode_erc20_asset_data, to_internal_order, InternalOrder,
    SignedOrder,
};
pub use primitives::{ether, format_address, parse_address, WEI_PER_ETHER};
