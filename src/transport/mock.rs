//! In-memory chain for testing fixture services without a node.

use super::{Chain, RpcError, TxRequest};
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock chain with fixed accounts and balances that records every write.
#[derive(Debug)]
pub struct MockChain {
    addresses: Vec<Address>,
    balances: HashMap<Address, U256>,
    call_results: HashMap<Address, Bytes>,
    network_id: u64,
    failing_send: Option<usize>,
    sent: Mutex<Vec<TxRequest>>,
    signed: Mutex<Vec<(Address, Vec<u8>)>>,
    balance_queries: Mutex<Vec<Address>>,
}

impl MockChain {
    /// Create a mock with `count` accounts `0x..01`, `0x..02`, ... and no balance.
    pub fn with_accounts(count: usize) -> Self {
        let addresses = (0..count)
            .map(|i| Address::left_padding_from(&((i + 1) as u64).to_be_bytes()))
            .collect();
        Self::new(addresses)
    }

    pub fn new(addresses: Vec<Address>) -> Self {
        Self {
            addresses,
            balances: HashMap::new(),
            call_results: HashMap::new(),
            network_id: 50,
            failing_send: None,
            sent: Mutex::new(Vec::new()),
            signed: Mutex::new(Vec::new()),
            balance_queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_balance(mut self, address: Address, balance: U256) -> Self {
        self.balances.insert(address, balance);
        self
    }

    /// Assign balances to the accounts in index order.
    pub fn with_balances(mut self, balances: &[U256]) -> Self {
        for (address, balance) in self.addresses.iter().zip(balances) {
            self.balances.insert(*address, *balance);
        }
        self
    }

    /// Return `result` for every `eth_call` against `contract`.
    pub fn with_call_result(mut self, contract: Address, result: Bytes) -> Self {
        self.call_results.insert(contract, result);
        self
    }

    pub fn with_network_id(mut self, network_id: u64) -> Self {
        self.network_id = network_id;
        self
    }

    /// Fail the n-th (zero-based) transaction submission.
    pub fn failing_send_at(mut self, index: usize) -> Self {
        self.failing_send = Some(index);
        self
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Successfully submitted transactions, oldest first.
    pub fn sent_transactions(&self) -> Vec<TxRequest> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn signed_messages(&self) -> Vec<(Address, Vec<u8>)> {
        self.signed.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn balance_queries(&self) -> Vec<Address> {
        self.balance_queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Chain for MockChain {
    async fn list_addresses(&self) -> Result<Vec<Address>, RpcError> {
        Ok(self.addresses.clone())
    }

    async fn get_balance(&self, address: Address) -> Result<U256, RpcError> {
        self.balance_queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(address);
        Ok(self.balances.get(&address).copied().unwrap_or(U256::ZERO))
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, RpcError> {
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        if self.failing_send == Some(sent.len()) {
            return Err(RpcError::JsonRpc {
                code: -32000,
                message: "transaction rejected".to_string(),
            });
        }
        if !self.addresses.contains(&tx.from) {
            return Err(RpcError::UnknownAccount(format!("{:#x}", tx.from)));
        }
        let hash = keccak256((sent.len() as u64).to_be_bytes());
        sent.push(tx);
        Ok(hash)
    }

    async fn call(&self, to: Address, _data: Bytes) -> Result<Bytes, RpcError> {
        Ok(self.call_results.get(&to).cloned().unwrap_or_default())
    }

    async fn sign_message(&self, signer: Address, message: &[u8]) -> Result<Bytes, RpcError> {
        if !self.addresses.contains(&signer) {
            return Err(RpcError::UnknownAccount(format!("{:#x}", signer)));
        }
        self.signed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((signer, message.to_vec()));

        // r ‖ s ‖ v with v in {27, 28}
        let digest = keccak256(message);
        let mut signature = Vec::with_capacity(65);
        signature.extend_from_slice(digest.as_slice());
        signature.extend_from_slice(keccak256(digest).as_slice());
        signature.push(27);
        Ok(Bytes::from(signature))
    }

    async fn network_version(&self) -> Result<u64, RpcError> {
        Ok(self.network_id)
    }
}
