//! # JSON-RPC 2.0 Client
//!
//! A thin `reqwest` wrapper shared by the ledger and GSP oracles.
//!
//! ## Sync Bridging
//!
//! The oracle traits are synchronous. [`JsonRpcClient::call_blocking`]
//! drives the async request on the current Tokio runtime via
//! `Handle::block_on`, so it must run on a thread where blocking is allowed
//! (e.g. inside `tokio::task::spawn_blocking`), never on an async worker.
//!
//! ## Error Handling
//!
//! Connection failures, timeouts, non-2xx statuses, JSON-RPC error objects
//! and missing `result` fields all map to a distinct [`TransportError`].
//! There is no retry in this layer.

use std::time::Duration;

use xidauth_verify::TransportError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for one JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Endpoint URL.
    pub url: String,
    /// Request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl RpcConfig {
    /// Create a configuration with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// A JSON-RPC 2.0 client for one endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    client: reqwest::Client,
    url: String,
}

impl JsonRpcClient {
    pub fn new(config: RpcConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Unavailable {
                endpoint: config.url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: config.url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a request and return its `result` field.
    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        tracing::trace!(url = %self.url, method, "JSON-RPC request");
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout {
                        endpoint: self.url.clone(),
                    }
                } else {
                    TransportError::Unavailable {
                        endpoint: self.url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        if !resp.status().is_success() {
            return Err(TransportError::Unavailable {
                endpoint: self.url.clone(),
                reason: format!("HTTP {}", resp.status()),
            });
        }

        let json: serde_json::Value =
            resp.json()
                .await
                .map_err(|e| TransportError::InvalidResponse {
                    method: method.to_string(),
                    reason: format!("invalid JSON: {e}"),
                })?;

        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            return Err(TransportError::Rpc {
                method: method.to_string(),
                code: error.get("code").and_then(|c| c.as_i64()).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown RPC error")
                    .to_string(),
            });
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| TransportError::InvalidResponse {
                method: method.to_string(),
                reason: "missing 'result' field".to_string(),
            })
    }

    /// Blocking variant of [`call`](Self::call) for the sync oracle traits.
    pub fn call_blocking(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let rt = tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        rt.block_on(self.call(method, params))
    }

    /// Blocking call whose result is deserialized into `T`.
    pub fn call_typed<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, TransportError> {
        let result = self.call_blocking(method, params)?;
        serde_json::from_value(result).map_err(|e| TransportError::InvalidResponse {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(method: &str, value: &serde_json::Value) -> Result<u64, TransportError> {
    value
        .as_str()
        .and_then(|s| s.strip_prefix("0x"))
        .and_then(|s| u64::from_str_radix(s, 16).ok())
        .ok_or_else(|| TransportError::InvalidResponse {
            method: method.to_string(),
            reason: format!("expected hex quantity, got {value}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let c = RpcConfig::new("http://localhost:8545");
        assert_eq!(c.timeout_secs, 30);
        assert_eq!(c.with_timeout(5).timeout_secs, 5);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("m", &serde_json::json!("0x89")).unwrap(), 137);
        assert_eq!(parse_quantity("m", &serde_json::json!("0x0")).unwrap(), 0);
        assert!(parse_quantity("m", &serde_json::json!("89")).is_err());
        assert!(parse_quantity("m", &serde_json::json!(137)).is_err());
        assert!(parse_quantity("m", &serde_json::json!("0x")).is_err());
    }

    #[test]
    fn test_blocking_call_without_runtime() {
        let client = JsonRpcClient::new(RpcConfig::new("http://127.0.0.1:1")).unwrap();
        assert_eq!(
            client.call_blocking("eth_chainId", serde_json::json!([])),
            Err(TransportError::NoRuntime)
        );
    }
}
