//! Error types for the faucet service

use crate::queue::SlotError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Fallback message when the network client gives no usable reason.
pub const GENERIC_CLAIM_FAILURE: &str = "Claim failed";

/// Faucet service errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaucetError {
    /// Malformed address or chain id, rejected before dispatch
    #[error("Validation Error: {0}")]
    Validation(String),

    /// Unsupported network or missing contract address
    #[error("Configuration Error: {0}")]
    Configuration(String),

    /// Network submission or confirmation failure
    #[error("{0}")]
    Claim(String),

    /// Queue slot torn down before it reported an outcome
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FaucetError {
    pub fn unsupported_network(chain_id: u64) -> Self {
        FaucetError::Configuration(format!("unsupported network {}", chain_id))
    }

    pub fn missing_contract(chain_id: u64) -> Self {
        FaucetError::Configuration(format!(
            "faucet contract address not configured for network {}",
            chain_id
        ))
    }
}

impl From<NetworkError> for FaucetError {
    fn from(err: NetworkError) -> Self {
        FaucetError::Claim(err.best_reason())
    }
}

impl From<SlotError> for FaucetError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::Network(e) => e.into(),
            aborted @ SlotError::Aborted(_) => FaucetError::Internal(aborted.to_string()),
        }
    }
}

impl IntoResponse for FaucetError {
    fn into_response(self) -> Response {
        // Every failure surfaces as a 400 with a bare `{error}` body.
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

pub type FaucetResult<T> = Result<T, FaucetError>;

/// Failure reported by the network client while submitting or confirming a claim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct NetworkError {
    /// Raw transport or node message
    pub message: String,
    /// Structured reason (node error message or decoded revert string)
    pub reason: Option<String>,
    /// JSON-RPC error code, when the node answered with one
    pub code: Option<i64>,
}

impl NetworkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: None,
            code: None,
        }
    }

    pub fn with_reason(message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: Some(reason.into()),
            code: None,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// Most specific human-readable reason available.
    pub fn best_reason(&self) -> String {
        self.reason
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .or_else(|| Some(self.message.as_str()).filter(|m| !m.trim().is_empty()))
            .unwrap_or(GENERIC_CLAIM_FAILURE)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_reason_prefers_structured_reason() {
        let err = NetworkError::with_reason("execution reverted", "Faucet: already claimed");
        assert_eq!(err.best_reason(), "Faucet: already claimed");
    }

    #[test]
    fn test_best_reason_falls_back() {
        assert_eq!(NetworkError::new("connection refused").best_reason(), "connection refused");
        assert_eq!(NetworkError::with_reason("", "  ").best_reason(), GENERIC_CLAIM_FAILURE);
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(
            FaucetError::Validation("Address not valid".into()).to_string(),
            "Validation Error: Address not valid"
        );
        assert_eq!(
            FaucetError::unsupported_network(999).to_string(),
            "Configuration Error: unsupported network 999"
        );
        assert_eq!(FaucetError::Claim("nonce too low".into()).to_string(), "nonce too low");
    }

    #[test]
    fn test_slot_errors_map_to_claim_and_internal() {
        let failed = SlotError::Network(NetworkError::with_reason("rpc", "nonce too low"));
        assert_eq!(FaucetError::from(failed), FaucetError::Claim("nonce too low".into()));
        assert_eq!(
            FaucetError::from(SlotError::Aborted(3)).to_string(),
            "Internal error: claim #3 was aborted before completing"
        );
    }

    #[test]
    fn test_into_response_is_bad_request() {
        let response = FaucetError::missing_contract(5).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
