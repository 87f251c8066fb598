//! Local signer stage backed by accounts derived from a mnemonic.

use super::{parse_bytes, parse_quantity, parse_u64, Next, RpcError, Stage, TxRequest};
use crate::domain::format_address;
use crate::error::FixtureError;
use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, TxKind};
use alloy::signers::local::coins_bip39::English;
use alloy::signers::local::{MnemonicBuilder, PrivateKeySigner};
use alloy::signers::SignerSync;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// Answers account, signing and transaction-submission requests with keys
/// derived at `m/<base path>/<index>` for `index` in `0..search_limit`.
#[derive(Debug)]
pub struct MnemonicSignerStage {
    accounts: Vec<PrivateKeySigner>,
}

impl MnemonicSignerStage {
    pub fn from_mnemonic(
        phrase: &str,
        base_derivation_path: &str,
        search_limit: usize,
    ) -> Result<Self, FixtureError> {
        let base = base_derivation_path
            .trim()
            .trim_start_matches("m/")
            .trim_end_matches('/');

        let mut accounts = Vec::with_capacity(search_limit);
        for index in 0..search_limit {
            let path = format!("m/{}/{}", base, index);
            let signer = MnemonicBuilder::<English>::default()
                .phrase(phrase)
                .derivation_path(&path)
                .and_then(|builder| builder.build())
                .map_err(|e| {
                    FixtureError::TransportConstruction(format!(
                        "cannot derive account at {}: {}",
                        path, e
                    ))
                })?;
            accounts.push(signer);
        }

        debug!(
            "Derived {} accounts from base path {}",
            accounts.len(),
            base
        );
        Ok(Self { accounts })
    }

    /// Derived addresses in index order.
    pub fn addresses(&self) -> Vec<Address> {
        self.accounts.iter().map(|a| a.address()).collect()
    }

    fn account(&self, address: &Address) -> Result<&PrivateKeySigner, RpcError> {
        self.accounts
            .iter()
            .find(|a| a.address() == *address)
            .ok_or_else(|| RpcError::UnknownAccount(format_address(address)))
    }

    fn eth_sign(&self, params: &Value) -> Result<Value, RpcError> {
        let address = params
            .get(0)
            .ok_or_else(|| RpcError::Parse("eth_sign: missing address".to_string()))
            .and_then(super::parse_address_value)?;
        let message = params
            .get(1)
            .ok_or_else(|| RpcError::Parse("eth_sign: missing data".to_string()))
            .and_then(parse_bytes)?;

        let signature = self
            .account(&address)?
            .sign_message_sync(&message)
            .map_err(|e| RpcError::Signing(e.to_string()))?;

        Ok(json!(format!("0x{}", hex::encode(signature.as_bytes()))))
    }

    async fn send_transaction(&self, params: &Value, next: Next<'_>) -> Result<Value, RpcError> {
        let object = params
            .get(0)
            .ok_or_else(|| RpcError::Parse("eth_sendTransaction: missing object".to_string()))?;
        let request = TxRequest::from_rpc_object(object)?;
        let signer = self.account(&request.from)?;

        let nonce = parse_u64(
            &next
                .run(
                    "eth_getTransactionCount",
                    json!([format_address(&request.from), "pending"]),
                )
                .await?,
        )?;
        let gas_price = parse_quantity(&next.run("eth_gasPrice", json!([])).await?)?;
        let gas_price = u128::try_from(gas_price)
            .map_err(|_| RpcError::Parse(format!("Gas price overflows u128: {}", gas_price)))?;
        let chain_id = match next.run("eth_chainId", json!([])).await {
            Ok(value) => Some(parse_u64(&value)?),
            // Nodes predating eth_chainId get unprotected legacy signatures.
            Err(err) if is_method_missing(&err) => {
                debug!("Node has no eth_chainId, signing without replay protection");
                None
            }
            Err(err) => return Err(err),
        };

        let mut tx = TxLegacy {
            chain_id,
            nonce,
            gas_price,
            gas_limit: request.gas,
            to: TxKind::Call(request.to),
            value: request.value,
            input: request.data,
        };
        let signature = signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| RpcError::Signing(e.to_string()))?;
        let raw = TxEnvelope::from(tx.into_signed(signature)).encoded_2718();

        debug!(
            "Signed transaction from {} nonce {} ({} bytes)",
            format_address(&request.from),
            nonce,
            raw.len()
        );
        next.run(
            "eth_sendRawTransaction",
            json!([format!("0x{}", hex::encode(raw))]),
        )
        .await
    }
}

fn is_method_missing(err: &RpcError) -> bool {
    match err {
        RpcError::JsonRpc { code, message } => {
            *code == -32601 || message.to_ascii_lowercase().contains("not supported")
        }
        _ => false,
    }
}

#[async_trait]
impl Stage for MnemonicSignerStage {
    fn name(&self) -> &'static str {
        "mnemonic-signer"
    }

    async fn handle(&self, method: &str, params: Value, next: Next<'_>) -> Result<Value, RpcError> {
        match method {
            "eth_accounts" => Ok(json!(self
                .addresses()
                .iter()
                .map(format_address)
                .collect::<Vec<_>>())),
            "eth_sign" => self.eth_sign(&params),
            "eth_sendTransaction" => self.send_transaction(&params, next).await,
            _ => next.run(method, params).await,
        }
    }
}
