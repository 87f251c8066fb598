//! Sell-order fixture batches.

use super::selector::MAKER_ACCOUNT_INDEX;
use crate::domain::{format_address, to_internal_order, InternalOrder, SignedOrder};
use crate::error::FixtureError;
use crate::transport::Chain;
use alloy::primitives::{address, Address, U256};
use async_trait::async_trait;
use tracing::info;

/// Orders per fixture batch.
pub const SELL_ORDER_COUNT: usize = 10;

/// ZRX on the local development network.
pub const MAKER_ASSET: Address = address!("0x871dd7c2b4b25e1aa18728e9d5f2af4c4e431f5c");
/// WETH on the local development network.
pub const TAKER_ASSET: Address = address!("0x0b1ba0af832d7c05fd64161e0db78e85978e8082");
/// 0.5 × 10^18
pub const MAKER_ASSET_AMOUNT: U256 = U256::from_limbs([500_000_000_000_000_000, 0, 0, 0]);
/// 1 × 10^18
pub const TAKER_ASSET_AMOUNT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// What a maker offers and to whom fills are restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerms {
    pub maker: Address,
    /// Only this address may submit fills of the order.
    pub sender: Address,
    pub maker_asset: Address,
    pub maker_amount: U256,
    pub taker_asset: Address,
    pub taker_amount: U256,
}

/// Allowance and order signing on behalf of a maker.
#[async_trait]
pub trait OrderHelper: Send + Sync {
    /// Let the exchange's asset proxy move any amount of `asset` owned by `owner`.
    async fn grant_unlimited_allowance(
        &self,
        asset: Address,
        owner: Address,
    ) -> Result<(), FixtureError>;

    /// Build a fresh order for `terms` and sign it with the maker's key.
    async fn create_signed_order(&self, terms: &OrderTerms) -> Result<SignedOrder, FixtureError>;
}

/// Sign [`SELL_ORDER_COUNT`] identical-terms sell orders restricted to `taker`.
///
/// The maker is the account at [`MAKER_ACCOUNT_INDEX`]. Its allowance is
/// granted once before the first order is signed.
pub async fn generate_sell_orders<C, H>(
    chain: &C,
    helper: &H,
    taker: Address,
) -> Result<Vec<InternalOrder>, FixtureError>
where
    C: Chain + ?Sized,
    H: OrderHelper + ?Sized,
{
    let addresses = chain.list_addresses().await?;
    let maker = *addresses
        .get(MAKER_ACCOUNT_INDEX)
        .ok_or(FixtureError::EmptyAccountSet)?;

    let terms = OrderTerms {
        maker,
        sender: taker,
        maker_asset: MAKER_ASSET,
        maker_amount: MAKER_ASSET_AMOUNT,
        taker_asset: TAKER_ASSET,
        taker_amount: TAKER_ASSET_AMOUNT,
    };

    helper.grant_unlimited_allowance(MAKER_ASSET, maker).await?;

    let mut orders = Vec::with_capacity(SELL_ORDER_COUNT);
    for _ in 0..SELL_ORDER_COUNT {
        let signed = helper.create_signed_order(&terms).await?;
        orders.push(to_internal_order(&signed)?);
    }

    info!(
        "Generated {} sell orders from maker {} for sender {}",
        orders.len(),
        format_address(&maker),
        format_address(&taker)
    );
    Ok(orders)
}
