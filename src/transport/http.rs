//! JSON-RPC 2.0 over HTTP, the terminal stage of the pipeline.

use super::{Next, RpcError, Stage};
use crate::error::FixtureError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct HttpTransportStage {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpTransportStage {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FixtureError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FixtureError::TransportConstruction(e.to_string()))?;
        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Stage for HttpTransportStage {
    fn name(&self) -> &'static str {
        "http-transport"
    }

    async fn handle(&self, method: &str, params: Value, _next: Next<'_>) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RpcError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unexpected status")
                    .to_string(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| RpcError::Parse(e.to_string()))?;
        debug!("RPC #{} {} answered", id, method);
        parse_response(body)
    }
}

fn parse_response(body: Value) -> Result<Value, RpcError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(RpcError::JsonRpc { code, message });
    }

    match body {
        Value::Object(mut fields) => fields
            .remove("result")
            .ok_or_else(|| RpcError::Parse("Missing result field".to_string())),
        other => Err(RpcError::Parse(format!(
            "Expected JSON-RPC response object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_result() {
        let body = json!({"jsonrpc": "2.0", "id": 1, "result": "0x32"});
        assert_eq!(parse_response(body).unwrap(), json!("0x32"));
    }

    #[test]
    fn test_parse_response_null_result() {
        let body = json!({"jsonrpc": "2.0", "id": 1, "result": null});
        assert_eq!(parse_response(body).unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_response_error_object() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        });
        match parse_response(body) {
            Err(RpcError::JsonRpc { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("Expected JsonRpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_missing_result() {
        let body = json!({"jsonrpc": "2.0", "id": 1});
        assert!(matches!(parse_response(body), Err(RpcError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let stage = HttpTransportStage::new(
            "http://127.0.0.1:1".to_string(),
            Duration::from_millis(500),
        )
        .unwrap();
        assert_eq!(stage.url(), "http://127.0.0.1:1");
        let pipeline = crate::transport::Pipeline::new(vec![Box::new(stage)]);
        pipeline.start().unwrap();
        let err = pipeline.request("net_version", json!([])).await.unwrap_err();
        assert!(matches!(err, RpcError::Network(_)));
    }
}
