use crate::transport::RpcError;
use alloy::primitives::U256;
use thiserror::Error;

/// Failure of a fixture operation. Nothing here is recovered locally.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("No address has more than {minimum} wei")]
    InsufficientFunds { minimum: U256 },
    #[error("Failed to construct transport pipeline: {0}")]
    TransportConstruction(String),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("No contract addresses known for network {0}")]
    UnknownNetwork(u64),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Node exposes no accounts")]
    EmptyAccountSet,
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Unsupported asset data: {0}")]
    UnsupportedAssetData(String),
}
