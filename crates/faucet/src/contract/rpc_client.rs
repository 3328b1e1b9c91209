//! Minimal Ethereum JSON-RPC client

use crate::address::{to_hex, Address};
use crate::error::NetworkError;
use ethabi::{ParamType, Token};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Selector of the Solidity `Error(string)` revert payload
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// RPC client for interacting with blockchain
pub struct JsonRpcClient {
    rpc_url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc_url,
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, NetworkError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed)
        });

        debug!("RPC {} -> {}", method, self.rpc_url);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NetworkError::new(format!("Request failed: {}", e)))?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| NetworkError::new(format!("Invalid response: {}", e)))?;

        if let Some(error) = json.get("error") {
            return Err(rpc_error(method, error));
        }

        Ok(json.get("result").cloned().unwrap_or(Value::Null))
    }

    pub async fn get_transaction_count(&self, address: &Address, block: &str) -> Result<u64, NetworkError> {
        let result = self
            .call("eth_getTransactionCount", serde_json::json!([to_hex(address), block]))
            .await?;
        parse_quantity(&result).and_then(quantity_to_u64)
    }

    pub async fn gas_price(&self) -> Result<u128, NetworkError> {
        let result = self.call("eth_gasPrice", serde_json::json!([])).await?;
        parse_quantity(&result)
    }

    pub async fn estimate_gas(&self, call: Value) -> Result<u64, NetworkError> {
        let result = self.call("eth_estimateGas", serde_json::json!([call])).await?;
        parse_quantity(&result).and_then(quantity_to_u64)
    }

    pub async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, NetworkError> {
        let tx_hex = format!("0x{}", hex::encode(raw_tx));
        self.call("eth_sendRawTransaction", serde_json::json!([tx_hex]))
            .await
            .map(|v| v.as_str().unwrap_or_default().to_string())
    }

    /// `None` until the transaction is mined
    pub async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<Value>, NetworkError> {
        let result = self
            .call("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
            .await?;
        Ok(if result.is_null() { None } else { Some(result) })
    }
}

/// Convert a JSON-RPC error object into a `NetworkError`
fn rpc_error(method: &str, error: &Value) -> NetworkError {
    let code = error.get("code").and_then(Value::as_i64);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Some nodes nest revert data one level deeper
    let revert_reason = error
        .get("data")
        .and_then(|data| data.as_str().or_else(|| data.get("data").and_then(Value::as_str)))
        .and_then(decode_revert_reason);

    let reason = revert_reason.unwrap_or_else(|| message.clone());
    let mut err = NetworkError::with_reason(format!("{} failed: {}", method, error), reason);
    if let Some(code) = code {
        err = err.with_code(code);
    }
    err
}

/// Decode ABI `Error(string)` revert data
pub fn decode_revert_reason(data: &str) -> Option<String> {
    let bytes = hex::decode(data.trim_start_matches("0x")).ok()?;
    if bytes.len() < 4 || bytes[..4] != ERROR_STRING_SELECTOR {
        return None;
    }

    match ethabi::decode(&[ParamType::String], &bytes[4..]).ok()?.pop()? {
        Token::String(reason) => Some(reason),
        _ => None,
    }
}

/// Parse a hex quantity such as `"0x1a"`
pub fn parse_quantity(value: &Value) -> Result<u128, NetworkError> {
    let raw = value
        .as_str()
        .ok_or_else(|| NetworkError::new(format!("Expected hex quantity, got {}", value)))?;
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| NetworkError::new(format!("Invalid hex quantity {}: {}", raw, e)))
}

fn quantity_to_u64(value: u128) -> Result<u64, NetworkError> {
    u64::try_from(value).map_err(|_| NetworkError::new(format!("Quantity {} does not fit in u64", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revert_data(reason: &str) -> String {
        let mut bytes = ERROR_STRING_SELECTOR.to_vec();
        bytes.extend(ethabi::encode(&[Token::String(reason.to_string())]));
        format!("0x{}", hex::encode(bytes))
    }

    #[test]
    fn test_decode_revert_reason() {
        assert_eq!(
            decode_revert_reason(&revert_data("Faucet: too soon")).as_deref(),
            Some("Faucet: too soon")
        );
        assert_eq!(decode_revert_reason("0xdeadbeef"), None);
        assert_eq!(decode_revert_reason("garbage"), None);
    }

    #[test]
    fn test_rpc_error_prefers_revert_reason() {
        let error = serde_json::json!({
            "code": 3,
            "message": "execution reverted",
            "data": revert_data("Faucet: empty")
        });
        let err = rpc_error("eth_estimateGas", &error);
        assert_eq!(err.best_reason(), "Faucet: empty");
        assert_eq!(err.code, Some(3));

        let plain = serde_json::json!({ "code": -32000, "message": "nonce too low" });
        assert_eq!(rpc_error("eth_sendRawTransaction", &plain).best_reason(), "nonce too low");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&serde_json::json!("0x1a")).unwrap(), 26);
        assert_eq!(parse_quantity(&serde_json::json!("0x")).unwrap(), 0);
        assert!(parse_quantity(&serde_json::json!(12)).is_err());
        assert!(parse_quantity(&serde_json::json!("0xzz")).is_err());
    }

    #[test]
    fn test_quantity_to_u64_rejects_overflow() {
        assert_eq!(quantity_to_u64(u64::MAX as u128).unwrap(), u64::MAX);
        assert!(quantity_to_u64(u64::MAX as u128 + 1).is_err());
    }
}
