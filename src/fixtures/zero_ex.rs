//! [`OrderHelper`] for 0x v2 exchange orders, signing through the chain's
//! own accounts.

use super::contracts::IERC20;
use super::orders::{OrderHelper, OrderTerms};
use crate::domain::order::ETH_SIGN_SIGNATURE_TYPE;
use crate::domain::{encode_erc20_asset_data, format_address, NetworkAddresses, SignedOrder};
use crate::error::FixtureError;
use crate::transport::{Chain, TxRequest};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::debug;

/// Validity window of generated orders.
pub const DEFAULT_ORDER_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct ZeroExOrderHelper<'c, C: Chain + ?Sized> {
    chain: &'c C,
    contracts: NetworkAddresses,
    gas_limit: u64,
    order_ttl: Duration,
}

impl<'c, C: Chain + ?Sized> ZeroExOrderHelper<'c, C> {
    pub fn new(chain: &'c C, contracts: NetworkAddresses, gas_limit: u64) -> Self {
        Self {
            chain,
            contracts,
            gas_limit,
            order_ttl: DEFAULT_ORDER_TTL,
        }
    }

    pub fn with_order_ttl(mut self, order_ttl: Duration) -> Self {
        self.order_ttl = order_ttl;
        self
    }
}

/// Turn an `r ‖ s ‖ v` personal signature into the exchange's
/// `v ‖ r ‖ s ‖ type` layout.
fn to_exchange_signature(personal: &[u8]) -> Result<Bytes, FixtureError> {
    if personal.len() != 65 {
        return Err(FixtureError::Signing(format!(
            "expected 65-byte signature, got {} bytes",
            personal.len()
        )));
    }
    let v = match personal[64] {
        v @ (27 | 28) => v,
        v @ (0 | 1) => v + 27,
        other => {
            return Err(FixtureError::Signing(format!(
                "unexpected recovery id {}",
                other
            )))
        }
    };

    let mut signature = Vec::with_capacity(66);
    signature.push(v);
    signature.extend_from_slice(&personal[..64]);
    signature.push(ETH_SIGN_SIGNATURE_TYPE);
    Ok(Bytes::from(signature))
}

#[async_trait]
impl<'c, C: Chain + ?Sized> OrderHelper for ZeroExOrderHelper<'c, C> {
    async fn grant_unlimited_allowance(
        &self,
        asset: Address,
        owner: Address,
    ) -> Result<(), FixtureError> {
        let approve = IERC20::approveCall {
            spender: self.contracts.erc20_proxy,
            value: U256::MAX,
        }
        .abi_encode();
        let hash = self
            .chain
            .send_transaction(TxRequest::contract_call(owner, asset, approve, self.gas_limit))
            .await?;
        debug!(
            "Unlimited allowance for {} on {} granted in {:#x}",
            format_address(&owner),
            format_address(&asset),
            hash
        );
        Ok(())
    }

    async fn create_signed_order(&self, terms: &OrderTerms) -> Result<SignedOrder, FixtureError> {
        let expiration = (Utc::now().timestamp().max(0) as u64)
            .saturating_add(self.order_ttl.as_secs());

        let mut order = SignedOrder {
            exchange_address: self.contracts.exchange,
            maker_address: terms.maker,
            taker_address: Address::ZERO,
            fee_recipient_address: Address::ZERO,
            sender_address: terms.sender,
            maker_asset_amount: terms.maker_amount,
            taker_asset_amount: terms.taker_amount,
            maker_fee: U256::ZERO,
            taker_fee: U256::ZERO,
            expiration_time_seconds: U256::from(expiration),
            salt: U256::from_be_bytes(rand::random::<[u8; 32]>()),
            maker_asset_data: encode_erc20_asset_data(terms.maker_asset),
            taker_asset_data: encode_erc20_asset_data(terms.taker_asset),
            signature: Bytes::new(),
        };

        let hash = order.order_hash();
        let personal = self.chain.sign_message(terms.maker, hash.as_slice()).await?;
        order.signature = to_exchange_signature(&personal)?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{decode_erc20_asset_data, LOCAL_NETWORK_ID};
    use crate::fixtures::orders::{MAKER_ASSET, MAKER_ASSET_AMOUNT, TAKER_ASSET, TAKER_ASSET_AMOUNT};
    use crate::transport::MockChain;

    fn contracts() -> NetworkAddresses {
        NetworkAddresses::for_network(LOCAL_NETWORK_ID).unwrap()
    }

    fn terms(mock: &MockChain) -> OrderTerms {
        OrderTerms {
            maker: mock.addresses()[0],
            sender: mock.addresses()[1],
            maker_asset: MAKER_ASSET,
            maker_amount: MAKER_ASSET_AMOUNT,
            taker_asset: TAKER_ASSET,
            taker_amount: TAKER_ASSET_AMOUNT,
        }
    }

    #[tokio::test]
    async fn test_allowance_approves_proxy_for_max() {
        let mock = MockChain::with_accounts(2);
        let helper = ZeroExOrderHelper::new(&mock, contracts(), 400_000);
        helper
            .grant_unlimited_allowance(MAKER_ASSET, mock.addresses()[0])
            .await
            .unwrap();

        let sent = mock.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, mock.addresses()[0]);
        assert_eq!(sent[0].to, MAKER_ASSET);
        assert_eq!(
            sent[0].data.to_vec(),
            IERC20::approveCall {
                spender: contracts().erc20_proxy,
                value: U256::MAX
            }
            .abi_encode()
        );
    }

    #[tokio::test]
    async fn test_signed_order_fields_and_signature_layout() {
        let mock = MockChain::with_accounts(2);
        let helper = ZeroExOrderHelper::new(&mock, contracts(), 400_000)
            .with_order_ttl(Duration::from_secs(60));
        let before = Utc::now().timestamp() as u64;
        let order = helper.create_signed_order(&terms(&mock)).await.unwrap();

        assert_eq!(order.exchange_address, contracts().exchange);
        assert_eq!(order.maker_address, mock.addresses()[0]);
        assert_eq!(order.sender_address, mock.addresses()[1]);
        assert_eq!(order.taker_address, Address::ZERO);
        assert_eq!(decode_erc20_asset_data(&order.maker_asset_data).unwrap(), MAKER_ASSET);
        assert_eq!(decode_erc20_asset_data(&order.taker_asset_data).unwrap(), TAKER_ASSET);

        let expiration = u64::try_from(order.expiration_time_seconds).unwrap();
        assert!(expiration >= before + 60 && expiration <= before + 120);

        assert_eq!(order.signature.len(), 66);
        assert_eq!(order.signature[0], 27);
        assert_eq!(order.signature[65], ETH_SIGN_SIGNATURE_TYPE);

        let signed = mock.signed_messages();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].0, mock.addresses()[0]);
        assert_eq!(signed[0].1, order.order_hash().to_vec());
    }

    #[tokio::test]
    async fn test_huge_ttl_saturates_expiration() {
        let mock = MockChain::with_accounts(2);
        let helper = ZeroExOrderHelper::new(&mock, contracts(), 400_000)
            .with_order_ttl(Duration::from_secs(u64::MAX));
        let order = helper.create_signed_order(&terms(&mock)).await.unwrap();
        assert_eq!(order.expiration_time_seconds, U256::from(u64::MAX));
    }

    #[tokio::test]
    async fn test_orders_get_fresh_salts() {
        let mock = MockChain::with_accounts(2);
        let helper = ZeroExOrderHelper::new(&mock, contracts(), 400_000);
        let first = helper.create_signed_order(&terms(&mock)).await.unwrap();
        let second = helper.create_signed_order(&terms(&mock)).await.unwrap();
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.order_hash(), second.order_hash());
    }

    #[test]
    fn test_exchange_signature_layout() {
        let mut personal = vec![0x11; 32];
        personal.extend(vec![0x22; 32]);
        personal.push(1);
        let signature = to_exchange_signature(&personal).unwrap();
        assert_eq!(signature[0], 28);
        assert_eq!(&signature[1..33], &[0x11; 32][..]);
        assert_eq!(&signature[33..65], &[0x22; 32][..]);
        assert_eq!(signature[65], 0x03);

        assert!(to_exchange_signature(&personal[..64]).is_err());
        personal[64] = 5;
        assert!(to_exchange_signature(&personal).is_err());
    }
}
