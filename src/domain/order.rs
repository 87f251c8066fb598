//! 0x v2 signed orders and the flat order representation handed to consumers.

use crate::domain::format_address;
use crate::error::FixtureError;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::{eip712_domain, SolStruct};
use serde::{Deserialize, Serialize};

/// Proxy id prefix of ERC-20 asset data (`bytes4(keccak256("ERC20Token(address)"))`).
pub const ERC20_PROXY_ID: [u8; 4] = [0xf4, 0x72, 0x61, 0xb0];

/// Trailing signature-type byte for `eth_sign` signatures.
pub const ETH_SIGN_SIGNATURE_TYPE: u8 = 0x03;

sol! {
    struct Order {
        address makerAddress;
        address takerAddress;
        address feeRecipientAddress;
        address senderAddress;
        uint256 makerAssetAmount;
        uint256 takerAssetAmount;
        uint256 makerFee;
        uint256 takerFee;
        uint256 expirationTimeSeconds;
        uint256 salt;
        bytes makerAssetData;
        bytes takerAssetData;
    }
}

/// An order signed by its maker. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder {
    pub exchange_address: Address,
    pub maker_address: Address,
    pub taker_address: Address,
    pub fee_recipient_address: Address,
    pub sender_address: Address,
    pub maker_asset_amount: U256,
    pub taker_asset_amount: U256,
    pub maker_fee: U256,
    pub taker_fee: U256,
    pub expiration_time_seconds: U256,
    pub salt: U256,
    pub maker_asset_data: Bytes,
    pub taker_asset_data: Bytes,
    pub signature: Bytes,
}

impl SignedOrder {
    /// EIP-712 hash the maker signs, scoped to the exchange contract.
    pub fn order_hash(&self) -> B256 {
        let domain = eip712_domain! {
            name: "0x Protocol",
            version: "2",
            verifying_contract: self.exchange_address,
        };
        self.as_typed().eip712_signing_hash(&domain)
    }

    fn as_typed(&self) -> Order {
        Order {
            makerAddress: self.maker_address,
            takerAddress: self.taker_address,
            feeRecipientAddress: self.fee_recipient_address,
            senderAddress: self.sender_address,
            makerAssetAmount: self.maker_asset_amount,
            takerAssetAmount: self.taker_asset_amount,
            makerFee: self.maker_fee,
            takerFee: self.taker_fee,
            expirationTimeSeconds: self.expiration_time_seconds,
            salt: self.salt,
            makerAssetData: self.maker_asset_data.clone(),
            takerAssetData: self.taker_asset_data.clone(),
        }
    }
}

/// Flat order as consumed by the order book client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalOrder {
    pub hash: String,
    pub exchange_address: String,
    pub maker_address: String,
    pub taker_address: String,
    pub sender_address: String,
    pub fee_recipient_address: String,
    pub maker_asset_address: String,
    pub taker_asset_address: String,
    /// Decimal string in the token's smallest unit.
    pub maker_asset_amount: String,
    pub taker_asset_amount: String,
    pub maker_fee: String,
    pub taker_fee: String,
    pub expiration_time_seconds: String,
    pub salt: String,
    pub signature: String,
}

pub fn encode_erc20_asset_data(token: Address) -> Bytes {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&ERC20_PROXY_ID);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(token.as_slice());
    Bytes::from(data)
}

pub fn decode_erc20_asset_data(data: &[u8]) -> Result<Address, FixtureError> {
    let malformed = || FixtureError::UnsupportedAssetData(format!("0x{}", hex::encode(data)));
    if data.len() != 36 || data[..4] != ERC20_PROXY_ID || data[4..16].iter().any(|b| *b != 0) {
        return Err(malformed());
    }
    Ok(Address::from_slice(&data[16..36]))
}

/// Convert a signed order into the consumer's representation.
pub fn to_internal_order(order: &SignedOrder) -> Result<InternalOrder, FixtureError> {
    let maker_asset = decode_erc20_asset_data(&order.maker_asset_data)?;
    let taker_asset = decode_erc20_asset_data(&order.taker_asset_data)?;

    Ok(InternalOrder {
        hash: format!("{:#x}", order.order_hash()),
        exchange_address: format_address(&order.exchange_address),
        maker_address: format_address(&order.maker_address),
        taker_address: format_address(&order.taker_address),
        sender_address: format_address(&order.sender_address),
        fee_recipient_address: format_address(&order.fee_recipient_address),
        maker_asset_address: format_address(&maker_asset),
        taker_asset_address: format_address(&taker_asset),
        maker_asset_amount: order.maker_asset_amount.to_string(),
        taker_asset_amount: order.taker_asset_amount.to_string(),
        maker_fee: order.maker_fee.to_string(),
        taker_fee: order.taker_fee.to_string(),
        expiration_time_seconds: order.expiration_time_seconds.to_string(),
        salt: order.salt.to_string(),
        signature: format!("0x{}", hex::encode(&order.signature)),
    })
}
