//! portal-rpc: Minimal EVM JSON-RPC client
//!
//! Only what the bridge needs from a wallet-side provider: the current gas
//! price of a chain. Every configured RPC URL of a network is tried in order
//! until one answers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use portal_core::{ChainId, NetworkError, NetworkRegistry, RpcConfig};
use serde::{Deserialize, Serialize};

/// Result type for RPC client operations
pub type Result<T> = std::result::Result<T, NetworkError>;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC client over the RPC endpoints of every registered network
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoints: Arc<HashMap<ChainId, Vec<String>>>,
    timeout: Duration,
}

impl RpcClient {
    /// Build a client for all networks in the registry
    pub fn from_registry(registry: &NetworkRegistry, config: &RpcConfig) -> Result<Self> {
        let endpoints = registry
            .networks()
            .map(|n| (n.id, n.rpc_urls.clone()))
            .collect();
        Self::new(endpoints, config)
    }

    pub fn new(endpoints: HashMap<ChainId, Vec<String>>, config: &RpcConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("portal")
            .build()
            .map_err(|e| NetworkError::Rpc {
                url: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoints: Arc::new(endpoints),
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Current gas price of a chain in wei (`eth_gasPrice`)
    pub async fn gas_price(&self, chain_id: ChainId) -> Result<u128> {
        let raw = self.call(chain_id, "eth_gasPrice").await?;
        parse_quantity(&raw)
    }

    /// Call a parameterless method, falling back across endpoints
    async fn call(&self, chain_id: ChainId, method: &str) -> Result<String> {
        let urls = self
            .endpoints
            .get(&chain_id)
            .filter(|urls| !urls.is_empty())
            .ok_or(NetworkError::NoRpcEndpoint { chain_id })?;

        let mut last_error = NetworkError::NoRpcEndpoint { chain_id };
        for url in urls {
            match self.call_endpoint(url, method).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::debug!(chain_id, url = %url, error = %e, "RPC endpoint failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn call_endpoint(&self, url: &str, method: &str) -> Result<String> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params: Vec::new(),
        };
        let rpc_error = |message: String| NetworkError::Rpc {
            url: url.to_string(),
            message,
        };

        let send = async {
            self.http
                .post(url)
                .json(&request)
                .send()
                .await?
                .error_for_status()?
                .json::<RpcResponse>()
                .await
        };
        let response = timed_request(self.timeout, send)
            .await?
            .map_err(|e| rpc_error(e.to_string()))?;

        interpret_response(response).map_err(rpc_error)
    }
}

fn interpret_response(response: RpcResponse) -> std::result::Result<String, String> {
    if let Some(err) = response.error {
        return Err(format!("{} (code {})", err.message, err.code));
    }
    response
        .result
        .ok_or_else(|| "response has neither result nor error".to_string())
}

async fn timed_request<T>(
    timeout: Duration,
    fut: impl std::future::Future<Output = T>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| NetworkError::Timeout {
            secs: timeout.as_secs(),
        })
}

/// Parse an EVM hex quantity (`0x3b9aca00`)
pub fn parse_quantity(raw: &str) -> Result<u128> {
    let invalid = || NetworkError::Rpc {
        url: String::new(),
        message: format!("invalid hex quantity '{}'", raw),
    };
    let digits = raw.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.is_empty() {
        return Err(invalid());
    }
    u128::from_str_radix(digits, 16).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x3b9aca00").unwrap(), 1_000_000_000);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("1000").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_interpret_response() {
        let ok: RpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#).unwrap();
        assert_eq!(interpret_response(ok).unwrap(), "0x10");

        let err: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
        )
        .unwrap();
        assert_eq!(
            interpret_response(err).unwrap_err(),
            "method not found (code -32601)"
        );
    }

    #[test]
    fn test_request_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_gasPrice",
            params: Vec::new(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "eth_gasPrice");
        assert_eq!(json["params"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_chain_has_no_endpoint() {
        let client = RpcClient::new(HashMap::new(), &RpcConfig::default()).unwrap();
        let err = client.gas_price(324).await.unwrap_err();
        assert!(matches!(err, NetworkError::NoRpcEndpoint { chain_id: 324 }));
    }

    #[tokio::test]
    async fn test_empty_endpoint_list() {
        let mut endpoints = HashMap::new();
        endpoints.insert(324, Vec::new());
        let client = RpcClient::new(endpoints, &RpcConfig::default()).unwrap();
        let err = client.gas_price(324).await.unwrap_err();
        assert_eq!(err.error_code(), "no_rpc_endpoint");
    }
}
