//! Funding target addresses with native currency and wrapped native tokens.

use super::contracts::IWrappedNative;
use super::selector::select_funded_account;
use crate::domain::{format_address, NetworkAddresses};
use crate::error::FixtureError;
use crate::transport::{Chain, RpcError, TxRequest};
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;
use tracing::{debug, info};

/// Send `amount` wei from a funded account to `to`.
pub async fn send_native<C: Chain + ?Sized>(
    chain: &C,
    to: Address,
    amount: U256,
    gas_limit: u64,
) -> Result<B256, FixtureError> {
    let from = select_funded_account(chain, amount).await?;
    let hash = chain
        .send_transaction(TxRequest::transfer(from, to, amount, gas_limit))
        .await?;
    info!(
        "Sent {} wei from {} to {} in {:#x}",
        amount,
        format_address(&from),
        format_address(&to),
        hash
    );
    Ok(hash)
}

/// Wrap `amount` wei in a funded account and transfer the tokens to `to`.
///
/// The deposit and the transfer are separate transactions. When the transfer
/// fails, the wrapped tokens stay with the funded account.
pub async fn send_wrapped_native<C: Chain + ?Sized>(
    chain: &C,
    network_id: u64,
    to: Address,
    amount: U256,
    gas_limit: u64,
) -> Result<B256, FixtureError> {
    let from = select_funded_account(chain, amount).await?;
    let token = NetworkAddresses::for_network(network_id)?.ether_token;

    let deposit = TxRequest::contract_call(
        from,
        token,
        IWrappedNative::depositCall {}.abi_encode(),
        gas_limit,
    )
    .with_value(amount);
    let deposit_hash = chain.send_transaction(deposit).await?;
    debug!(
        "Wrapped {} wei for {} in {:#x}",
        amount,
        format_address(&from),
        deposit_hash
    );

    let transfer = TxRequest::contract_call(
        from,
        token,
        IWrappedNative::transferCall { to, value: amount }.abi_encode(),
        gas_limit,
    );
    let hash = chain.send_transaction(transfer).await?;
    info!(
        "Transferred {} wrapped wei from {} to {} in {:#x}",
        amount,
        format_address(&from),
        format_address(&to),
        hash
    );
    Ok(hash)
}

/// Wrapped-token balance of `owner`.
pub async fn wrapped_native_balance<C: Chain + ?Sized>(
    chain: &C,
    network_id: u64,
    owner: Address,
) -> Result<U256, FixtureError> {
    let token = NetworkAddresses::for_network(network_id)?.ether_token;
    let data = IWrappedNative::balanceOfCall { owner }.abi_encode();
    let output = chain.call(token, data.into()).await?;
    if output.len() < 32 {
        return Err(RpcError::Parse(format!(
            "balanceOf returned {} bytes",
            output.len()
        ))
        .into());
    }
    Ok(U256::from_be_slice(&output[..32]))
}
