use super::orders::generate_sell_orders;
use super::readiness::{has_sufficient_balance, network_mismatch_message, should_seed_fixtures};
use super::transfer::{send_native, send_wrapped_native, wrapped_native_balance};
use super::zero_ex::ZeroExOrderHelper;
use crate::config::Config;
use crate::domain::{InternalOrder, NetworkAddresses};
use crate::error::FixtureError;
use crate::transport::{with_pipeline, Chain};
use alloy::primitives::{Address, B256, U256};

/// Entry point for fixture setup against the configured node.
///
/// Every operation builds its own pipeline and stops it before returning.
#[derive(Debug, Clone)]
pub struct FixtureSeeder {
    config: Config,
}

impl FixtureSeeder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn should_seed_fixtures(&self) -> bool {
        should_seed_fixtures(&self.config)
    }

    pub async fn send_native(&self, to: Address, amount: U256) -> Result<B256, FixtureError> {
        let gas_limit = self.config.gas_limit;
        with_pipeline(&self.config, move |p| {
            Box::pin(async move { send_native(p, to, amount, gas_limit).await })
        })
        .await
    }

    pub async fn send_wrapped_native(
        &self,
        to: Address,
        amount: U256,
    ) -> Result<B256, FixtureError> {
        let gas_limit = self.config.gas_limit;
        let network_id = self.config.network_id;
        with_pipeline(&self.config, move |p| {
            Box::pin(async move { send_wrapped_native(p, network_id, to, amount, gas_limit).await })
        })
        .await
    }

    pub async fn has_sufficient_balance(&self, address: Address) -> Result<bool, FixtureError> {
        with_pipeline(&self.config, move |p| {
            Box::pin(async move { has_sufficient_balance(p, address).await })
        })
        .await
    }

    pub async fn wrapped_native_balance(&self, owner: Address) -> Result<U256, FixtureError> {
        let network_id = self.config.network_id;
        with_pipeline(&self.config, move |p| {
            Box::pin(async move { wrapped_native_balance(p, network_id, owner).await })
        })
        .await
    }

    /// Sign a batch of sell orders whose fills are restricted to `taker`.
    pub async fn generate_sell_orders(
        &self,
        taker: Address,
    ) -> Result<Vec<InternalOrder>, FixtureError> {
        let contracts = NetworkAddresses::for_network(self.config.network_id)?;
        let gas_limit = self.config.gas_limit;
        with_pipeline(&self.config, move |p| {
            Box::pin(async move {
                let helper = ZeroExOrderHelper::new(p, contracts, gas_limit);
                generate_sell_orders(p, &helper, taker).await
            })
        })
        .await
    }

    /// Prompt to show when the node is not on the configured network.
    pub async fn network_mismatch_message(&self) -> Result<Option<String>, FixtureError> {
        let expected = self.config.network_id;
        with_pipeline(&self.config, move |p| {
            Box::pin(async move { network_mismatch_message(p, expected).await })
        })
        .await
    }

    /// Network id the node reports.
    pub async fn remote_network_id(&self) -> Result<u64, FixtureError> {
        with_pipeline(&self.config, |p| {
            Box::pin(async move { p.network_version().await.map_err(FixtureError::from) })
        })
        .await
    }
}
