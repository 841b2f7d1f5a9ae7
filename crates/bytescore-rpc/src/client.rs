//! Minimal JSON-RPC 2.0 client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytescore_core::error::LedgerError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

pub struct RpcClient {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Build a client for `endpoint` with a per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "rpc: request");

        let resp: Value = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?
            .json()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()))?;

        decode_response(resp)
    }
}

fn transport_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Timeout
    } else {
        LedgerError::Transport(e.to_string())
    }
}

/// Unwrap a JSON-RPC response envelope into its `result`.
pub fn decode_response<T: DeserializeOwned>(mut resp: Value) -> Result<T, LedgerError> {
    if let Some(err) = resp.get("error").filter(|e| !e.is_null()) {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_owned();
        return Err(LedgerError::Rpc { code, message });
    }
    let result = resp
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| LedgerError::Malformed("missing result".into()))?;
    serde_json::from_value(result).map_err(|e| LedgerError::Malformed(e.to_string()))
}
