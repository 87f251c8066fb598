//! Ordered request pipeline with a constructed → started → stopped lifecycle.
//!
//! A request enters the first stage; each stage either answers it or hands
//! it to the remaining stages through [`Next`]. Pipelines are never shared:
//! [`with_pipeline`] creates one, lends it to a single operation and stops
//! it on every exit path.

use super::{
    parse_address_value, parse_b256, parse_bytes, parse_quantity, Chain, HttpTransportStage,
    MnemonicSignerStage, RpcError, TxRequest,
};
use crate::config::Config;
use crate::domain::format_address;
use crate::error::FixtureError;
use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// One named step of the pipeline.
#[async_trait]
pub trait Stage: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn start(&self) -> Result<(), RpcError> {
        Ok(())
    }

    fn stop(&self) -> Result<(), RpcError> {
        Ok(())
    }

    /// Answer `method` or delegate it to `next`.
    async fn handle(&self, method: &str, params: Value, next: Next<'_>) -> Result<Value, RpcError>;
}

/// The stages after the current one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Box<dyn Stage>],
}

impl<'a> Next<'a> {
    pub fn run(self, method: &'a str, params: Value) -> BoxFuture<'a, Result<Value, RpcError>> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(method, params, Next { stages: rest }),
            None => Box::pin(futures::future::ready(Err(RpcError::Unhandled(
                method.to_string(),
            )))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Constructed,
    Started,
    /// Terminal; a stopped pipeline cannot be restarted.
    Stopped,
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    state: Mutex<PipelineState>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("state", &self.state())
            .finish()
    }
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            stages,
            state: Mutex::new(PipelineState::Constructed),
        }
    }

    /// Signer stage first so transactions are signed locally before the
    /// transport stage submits them.
    pub fn from_config(config: &Config) -> Result<Self, FixtureError> {
        let signer = MnemonicSignerStage::from_mnemonic(
            &config.mnemonic,
            &config.base_derivation_path,
            config.address_search_limit,
        )?;
        let transport = HttpTransportStage::new(
            config.rpc_url.clone(),
            Duration::from_millis(config.rpc_timeout_ms),
        )?;
        Ok(Self::new(vec![Box::new(signer), Box::new(transport)]))
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn start(&self) -> Result<(), RpcError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            PipelineState::Started => return Ok(()),
            PipelineState::Stopped => return Err(RpcError::Stopped),
            PipelineState::Constructed => {}
        }

        for (started, stage) in self.stages.iter().enumerate() {
            if let Err(err) = stage.start() {
                for earlier in self.stages[..started].iter().rev() {
                    if let Err(stop_err) = earlier.stop() {
                        warn!("Stage {} failed to stop after aborted start: {}", earlier.name(), stop_err);
                    }
                }
                *state = PipelineState::Stopped;
                return Err(err);
            }
        }

        *state = PipelineState::Started;
        debug!("Pipeline started with stages {:?}", self.stage_names());
        Ok(())
    }

    /// Stop every stage, last first. Only the first call has any effect;
    /// the first stage failure is returned after all stages were stopped.
    pub fn stop(&self) -> Result<(), RpcError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let was_started = *state == PipelineState::Started;
        if *state == PipelineState::Stopped {
            return Ok(());
        }
        *state = PipelineState::Stopped;
        if !was_started {
            return Ok(());
        }

        let mut first_error = None;
        for stage in self.stages.iter().rev() {
            if let Err(err) = stage.stop() {
                warn!("Stage {} failed to stop: {}", stage.name(), err);
                first_error.get_or_insert(err);
            }
        }
        debug!("Pipeline stopped");
        first_error.map_or(Ok(()), Err)
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match self.state() {
            PipelineState::Constructed => return Err(RpcError::NotStarted),
            PipelineState::Stopped => return Err(RpcError::Stopped),
            PipelineState::Started => {}
        }
        debug!("RPC {} {}", method, params);
        Next {
            stages: &self.stages,
        }
        .run(method, params)
        .await
    }
}

#[async_trait]
impl Chain for Pipeline {
    async fn list_addresses(&self) -> Result<Vec<Address>, RpcError> {
        let result = self.request("eth_accounts", json!([])).await?;
        result
            .as_array()
            .ok_or_else(|| RpcError::Parse("Expected array of accounts".to_string()))?
            .iter()
            .map(parse_address_value)
            .collect()
    }

    async fn get_balance(&self, address: Address) -> Result<U256, RpcError> {
        let result = self
            .request("eth_getBalance", json!([format_address(&address), "latest"]))
            .await?;
        parse_quantity(&result)
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, RpcError> {
        let result = self
            .request("eth_sendTransaction", json!([tx.to_rpc_object()]))
            .await?;
        parse_b256(&result)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        let call = json!({
            "to": format_address(&to),
            "data": format!("0x{}", hex::encode(&data)),
        });
        let result = self.request("eth_call", json!([call, "latest"])).await?;
        parse_bytes(&result)
    }

    async fn sign_message(&self, signer: Address, message: &[u8]) -> Result<Bytes, RpcError> {
        let result = self
            .request(
                "eth_sign",
                json!([format_address(&signer), format!("0x{}", hex::encode(message))]),
            )
            .await?;
        parse_bytes(&result)
    }

    async fn network_version(&self) -> Result<u64, RpcError> {
        let result = self.request("net_version", json!([])).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| RpcError::Parse(format!("Expected network id string, got {}", result)))?;
        raw.parse::<u64>()
            .map_err(|_| RpcError::Parse(format!("Invalid network id: {}", raw)))
    }
}

/// Stops the pipeline if the operation unwinds before `release`.
struct StopGuard<'p> {
    pipeline: &'p Pipeline,
    released: bool,
}

impl StopGuard<'_> {
    fn release(mut self) -> Result<(), RpcError> {
        self.released = true;
        self.pipeline.stop()
    }
}

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(err) = self.pipeline.stop() {
                warn!("Pipeline teardown after abort failed: {}", err);
            }
        }
    }
}

/// Start `pipeline`, run `f` against it and stop it on every exit path.
///
/// A teardown failure is returned only when `f` succeeded; otherwise the
/// operation's own error wins and the teardown failure is logged.
pub async fn with_started_pipeline<T, F>(pipeline: Pipeline, f: F) -> Result<T, FixtureError>
where
    F: for<'p> FnOnce(&'p Pipeline) -> BoxFuture<'p, Result<T, FixtureError>>,
{
    pipeline.start()?;
    let guard = StopGuard {
        pipeline: &pipeline,
        released: false,
    };

    let outcome = f(&pipeline).await;

    match (outcome, guard.release()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(stop_err)) => Err(stop_err.into()),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(stop_err)) => {
            warn!("Pipeline teardown failed after operation error: {}", stop_err);
            Err(err)
        }
    }
}

/// Build the configured pipeline and run `f` with it.
pub async fn with_pipeline<T, F>(config: &Config, f: F) -> Result<T, FixtureError>
where
    F: for<'p> FnOnce(&'p Pipeline) -> BoxFuture<'p, Result<T, FixtureError>>,
{
    let pipeline = Pipeline::from_config(config)?;
    with_started_pipeline(pipeline, f).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Counters {
        starts: AtomicUsize,
        stops: AtomicUsize,
        handled: AtomicUsize,
    }

    /// Answers `echo` itself and passes everything else on.
    #[derive(Debug)]
    struct EchoStage {
        counters: Arc<Counters>,
        fail_stop: bool,
    }

    #[async_trait]
    impl Stage for EchoStage {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn start(&self) -> Result<(), RpcError> {
            self.counters.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) -> Result<(), RpcError> {
            self.counters.stops.fetch_add(1, Ordering::SeqCst);
            if self.fail_stop {
                Err(RpcError::Network("socket already closed".to_string()))
            } else {
                Ok(())
            }
        }

        async fn handle(
            &self,
            method: &str,
            params: Value,
            next: Next<'_>,
        ) -> Result<Value, RpcError> {
            self.counters.handled.fetch_add(1, Ordering::SeqCst);
            if method == "echo" {
                Ok(params)
            } else {
                next.run(method, params).await
            }
        }
    }

    /// Terminal stage answering every method with its name.
    #[derive(Debug)]
    struct NameStage;

    #[async_trait]
    impl Stage for NameStage {
        fn name(&self) -> &'static str {
            "name"
        }

        async fn handle(
            &self,
            method: &str,
            _params: Value,
            _next: Next<'_>,
        ) -> Result<Value, RpcError> {
            Ok(json!(method))
        }
    }

    fn echo_pipeline(counters: &Arc<Counters>, fail_stop: bool) -> Pipeline {
        Pipeline::new(vec![
            Box::new(EchoStage {
                counters: counters.clone(),
                fail_stop,
            }),
            Box::new(NameStage),
        ])
    }

    #[tokio::test]
    async fn test_requests_flow_through_stages_in_order() {
        let counters = Arc::new(Counters::default());
        let pipeline = echo_pipeline(&counters, false);
        pipeline.start().unwrap();

        assert_eq!(pipeline.request("echo", json!([1])).await.unwrap(), json!([1]));
        assert_eq!(
            pipeline.request("eth_blockNumber", json!([])).await.unwrap(),
            json!("eth_blockNumber")
        );
        assert_eq!(counters.handled.load(Ordering::SeqCst), 2);
        assert_eq!(pipeline.stage_names(), vec!["echo", "name"]);
    }

    #[tokio::test]
    async fn test_unhandled_method_falls_off_the_end() {
        let counters = Arc::new(Counters::default());
        let pipeline = Pipeline::new(vec![Box::new(EchoStage {
            counters,
            fail_stop: false,
        })]);
        pipeline.start().unwrap();
        let err = pipeline.request("eth_chainId", json!([])).await.unwrap_err();
        assert!(matches!(err, RpcError::Unhandled(m) if m == "eth_chainId"));
    }

    #[tokio::test]
    async fn test_lifecycle_rejects_requests_outside_started() {
        let counters = Arc::new(Counters::default());
        let pipeline = echo_pipeline(&counters, false);
        assert_eq!(pipeline.state(), PipelineState::Constructed);
        assert!(matches!(
            pipeline.request("echo", json!([])).await,
            Err(RpcError::NotStarted)
        ));

        pipeline.start().unwrap();
        pipeline.stop().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert!(matches!(
            pipeline.request("echo", json!([])).await,
            Err(RpcError::Stopped)
        ));
        assert!(matches!(pipeline.start(), Err(RpcError::Stopped)));

        pipeline.stop().unwrap();
        assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_once_on_success() {
        let counters = Arc::new(Counters::default());
        let value = with_started_pipeline(echo_pipeline(&counters, false), |p| {
            Box::pin(async move { Ok::<_, FixtureError>(p.request("echo", json!(7)).await?) })
        })
        .await
        .unwrap();
        assert_eq!(value, json!(7));
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_once_on_error() {
        let counters = Arc::new(Counters::default());
        let result: Result<(), FixtureError> =
            with_started_pipeline(echo_pipeline(&counters, false), |_p| {
                Box::pin(async move { Err(FixtureError::EmptyAccountSet) })
            })
            .await;
        assert!(matches!(result, Err(FixtureError::EmptyAccountSet)));
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_once_on_panic() {
        let counters = Arc::new(Counters::default());
        let outcome = AssertUnwindSafe(with_started_pipeline::<(), _>(
            echo_pipeline(&counters, false),
            |_p| {
                Box::pin(async move {
                    if true {
                        panic!("fixture callback blew up");
                    }
                    Ok::<(), FixtureError>(())
                })
            },
        ))
        .catch_unwind()
        .await;
        assert!(outcome.is_err());
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_failure_does_not_mask_operation_error() {
        let counters = Arc::new(Counters::default());
        let result: Result<(), FixtureError> =
            with_started_pipeline(echo_pipeline(&counters, true), |_p| {
                Box::pin(async move { Err(FixtureError::EmptyAccountSet) })
            })
            .await;
        assert!(matches!(result, Err(FixtureError::EmptyAccountSet)));
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_failure_surfaces_after_success() {
        let counters = Arc::new(Counters::default());
        let result = with_started_pipeline(echo_pipeline(&counters, true), |_p| {
            Box::pin(async move { Ok::<(), FixtureError>(()) })
        })
        .await;
        assert!(matches!(result, Err(FixtureError::Rpc(RpcError::Network(_)))));
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_mnemonic_is_construction_error() {
        let config = Config {
            mnemonic: "definitely not a valid mnemonic phrase".to_string(),
            ..Config::default()
        };
        let result =
            with_pipeline(&config, |_p| Box::pin(async move { Ok::<(), FixtureError>(()) })).await;
        assert!(matches!(result, Err(FixtureError::TransportConstruction(_))));
    }
}
