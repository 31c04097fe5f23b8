//! Ledger feature-gate probing over JSON-RPC.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::errors::{ProverError, Result};

/// Source of truth for whether the ledger-native proof verifier is enabled.
#[async_trait]
pub trait FeatureGateClient: Send + Sync {
    async fn is_feature_active(&self, feature_id: &str) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    value: Option<AccountValue>,
}

#[derive(Debug, Deserialize)]
struct AccountValue {
    /// `[payload, encoding]`
    data: (String, String),
}

/// A feature account stores a bincode `Option<u64>` activation slot, so the
/// first byte is the `Some` tag once the feature is activated.
pub fn feature_active_from_account_data(data: &[u8]) -> bool {
    data.first() == Some(&1)
}

fn feature_state(response: RpcResponse<AccountInfo>) -> Result<bool> {
    if let Some(err) = response.error {
        return Err(ProverError::NetworkUnavailable(format!(
            "RPC error {}: {}",
            err.code, err.message
        )));
    }
    let info = response
        .result
        .ok_or_else(|| ProverError::NetworkUnavailable("empty RPC response".to_string()))?;

    let Some(account) = info.value else {
        return Ok(false);
    };

    let (payload, encoding) = account.data;
    if encoding != "base64" {
        return Err(ProverError::NetworkUnavailable(format!(
            "unexpected account encoding {}",
            encoding
        )));
    }
    let data = STANDARD
        .decode(payload)
        .map_err(|e| ProverError::NetworkUnavailable(format!("invalid account data: {}", e)))?;

    Ok(feature_active_from_account_data(&data))
}

/// Queries `getAccountInfo` for the feature account.
#[derive(Debug, Clone)]
pub struct RpcFeatureGateClient {
    client: reqwest::Client,
    url: String,
}

impl RpcFeatureGateClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeatureGateClient for RpcFeatureGateClient {
    async fn is_feature_active(&self, feature_id: &str) -> Result<bool> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getAccountInfo",
            "params": [feature_id, { "encoding": "base64" }],
        });

        debug!(url = %self.url, feature_id, "probing feature gate");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProverError::NetworkUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| ProverError::NetworkUnavailable(e.to_string()))?
            .json::<RpcResponse<AccountInfo>>()
            .await
            .map_err(|e| ProverError::NetworkUnavailable(e.to_string()))?;

        feature_state(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: serde_json::Value) -> Result<bool> {
        feature_state(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn test_activated_feature() {
        let data = STANDARD.encode([1u8, 0x2a, 0, 0, 0, 0, 0, 0, 0]);
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "context": { "slot": 100 },
                "value": {
                    "data": [data, "base64"],
                    "executable": false,
                    "lamports": 1,
                    "owner": "Feature111111111111111111111111111111111111",
                    "rentEpoch": 0
                }
            }
        });

        assert!(parse(body).unwrap());
    }

    #[test]
    fn test_pending_feature() {
        let data = STANDARD.encode([0u8]);
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "context": { "slot": 1 }, "value": { "data": [data, "base64"] } }
        });

        assert!(!parse(body).unwrap());
    }

    #[test]
    fn test_missing_account() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "context": { "slot": 1 }, "value": null }
        });

        assert!(!parse(body).unwrap());
    }

    #[test]
    fn test_rpc_error() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid param" }
        });

        assert!(matches!(
            parse(body),
            Err(ProverError::NetworkUnavailable(_))
        ));
    }

    #[test]
    fn test_account_data_tag() {
        assert!(feature_active_from_account_data(&[1, 0, 0]));
        assert!(!feature_active_from_account_data(&[0]));
        assert!(!feature_active_from_account_data(&[]));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Nothing listens on the discard port.
        let client = RpcFeatureGateClient::new("http://127.0.0.1:9");
        let result = client.is_feature_active("Feature111").await;

        assert!(matches!(result, Err(ProverError::NetworkUnavailable(_))));
    }
}
