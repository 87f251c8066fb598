//! Chain access for fixture operations.
//!
//! `Chain` is the capability the fixture services depend on. The live
//! implementation is a [`Pipeline`] of ordered stages (a local mnemonic
//! signer in front of a JSON-RPC HTTP transport); tests use [`MockChain`].

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

pub mod http;
pub mod mock;
pub mod pipeline;
pub mod signer;

pub use http::HttpTransportStage;
pub use mock::MockChain;
pub use pipeline::{with_pipeline, with_started_pipeline, Next, Pipeline, PipelineState, Stage};
pub use signer::MnemonicSignerStage;

/// Chain capability used by the fixture services.
#[async_trait]
pub trait Chain: Send + Sync {
    /// Accounts the signer controls, in derivation-index order.
    async fn list_addresses(&self) -> Result<Vec<Address>, RpcError>;

    /// Native balance in wei at the latest block.
    async fn get_balance(&self, address: Address) -> Result<U256, RpcError>;

    /// Submit a transaction from one of the signer's accounts, returning its hash.
    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, RpcError>;

    /// Read-only contract call at the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError>;

    /// EIP-191 personal signature (`r ‖ s ‖ v`) over `message` by `signer`.
    async fn sign_message(&self, signer: Address, message: &[u8]) -> Result<Bytes, RpcError>;

    /// Network id reported by the node (`net_version`).
    async fn network_version(&self) -> Result<u64, RpcError>;
}

/// Transaction submitted through [`Chain::send_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas: u64,
}

impl TxRequest {
    /// Plain value transfer.
    pub fn transfer(from: Address, to: Address, value: U256, gas: u64) -> Self {
        Self {
            from,
            to,
            value,
            data: Bytes::new(),
            gas,
        }
    }

    /// Contract call without attached value.
    pub fn contract_call(from: Address, to: Address, data: impl Into<Bytes>, gas: u64) -> Self {
        Self {
            from,
            to,
            value: U256::ZERO,
            data: data.into(),
            gas,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// `eth_sendTransaction` parameter object.
    pub fn to_rpc_object(&self) -> Value {
        json!({
            "from": format!("{:#x}", self.from),
            "to": format!("{:#x}", self.to),
            "value": to_quantity(self.value),
            "data": format!("0x{}", hex::encode(&self.data)),
            "gas": format!("{:#x}", self.gas),
        })
    }

    pub fn from_rpc_object(object: &Value) -> Result<Self, RpcError> {
        let field = |name: &str| {
            object
                .get(name)
                .ok_or_else(|| RpcError::Parse(format!("Missing {} field", name)))
        };

        let value = match object.get("value") {
            Some(v) => parse_quantity(v)?,
            None => U256::ZERO,
        };
        let data = match object.get("data").or_else(|| object.get("input")) {
            Some(v) => parse_bytes(v)?,
            None => Bytes::new(),
        };
        let gas = parse_u64(field("gas")?)?;

        Ok(Self {
            from: parse_address_value(field("from")?)?,
            to: parse_address_value(field("to")?)?,
            value,
            data,
            gas,
        })
    }
}

/// Error type for RPC round-trips and pipeline lifecycle violations.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },
    #[error("Pipeline not started")]
    NotStarted,
    #[error("Pipeline already stopped")]
    Stopped,
    #[error("No stage handled {0}")]
    Unhandled(String),
    #[error("Account {0} is not managed by the signer")]
    UnknownAccount(String),
    #[error("Signing error: {0}")]
    Signing(String),
}

/// Hex quantity encoding (`0x0`, `0x1bc16d674ec80000`, ...).
pub fn to_quantity(value: U256) -> String {
    format!("{:#x}", value)
}

pub fn parse_quantity(value: &Value) -> Result<U256, RpcError> {
    let raw = value
        .as_str()
        .ok_or_else(|| RpcError::Parse(format!("Expected hex quantity, got {}", value)))?;
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Parse(format!("Quantity without 0x prefix: {}", raw)))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Parse(format!("Invalid quantity {}: {}", raw, e)))
}

pub fn parse_u64(value: &Value) -> Result<u64, RpcError> {
    let quantity = parse_quantity(value)?;
    u64::try_from(quantity).map_err(|_| RpcError::Parse(format!("Quantity overflows u64: {}", value)))
}

pub fn parse_bytes(value: &Value) -> Result<Bytes, RpcError> {
    let raw = value
        .as_str()
        .ok_or_else(|| RpcError::Parse(format!("Expected hex data, got {}", value)))?;
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| RpcError::Parse(format!("Invalid hex data: {}", e)))
}

pub fn parse_b256(value: &Value) -> Result<B256, RpcError> {
    let bytes = parse_bytes(value)?;
    if bytes.len() != 32 {
        return Err(RpcError::Parse(format!(
            "Expected 32-byte hash, got {} bytes",
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}

pub fn parse_address_value(value: &Value) -> Result<Address, RpcError> {
    let bytes = parse_bytes(value)?;
    if bytes.len() != 20 {
        return Err(RpcError::Parse(format!(
            "Expected 20-byte address, got {} bytes",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}
