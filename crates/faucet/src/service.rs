//! Faucet service: validates inbound claims before handing them to the dispatcher

use crate::address::{parse_address, Address};
use crate::config::FaucetConfig;
use crate::contract::RpcContractConnector;
use crate::dispatcher::ClaimDispatcher;
use crate::error::{FaucetError, FaucetResult};
use crate::network::NetworkRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Body of `POST /api/faucet`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaucetRequest {
    #[serde(default)]
    pub address: String,

    /// Number or numeric string
    #[serde(default, rename = "chainId")]
    pub chain_id: Value,
}

/// Successful faucet response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetResponse {
    pub transaction: String,
}

/// Validated claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimRequest {
    pub recipient: Address,
    pub chain_id: u64,
}

impl TryFrom<&FaucetRequest> for ClaimRequest {
    type Error = FaucetError;

    fn try_from(request: &FaucetRequest) -> FaucetResult<Self> {
        let recipient = parse_address(request.address.trim())
            .ok_or_else(|| FaucetError::Validation("Address not valid".to_string()))?;
        let chain_id = parse_chain_id(&request.chain_id)
            .ok_or_else(|| FaucetError::Validation("ChainId not valid".to_string()))?;

        Ok(Self { recipient, chain_id })
    }
}

/// Non-negative integer as a JSON number, a decimal string or a `0x` hex string.
/// Whole-valued floats such as `5.0` are accepted.
fn parse_chain_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(digits) => u64::from_str_radix(digits, 16).ok(),
                None => s
                    .parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole_number)),
            }
        }
        _ => None,
    }
}

fn whole_number(value: f64) -> Option<u64> {
    let in_range = value.is_finite() && value >= 0.0 && value < u64::MAX as f64;
    (in_range && value.fract() == 0.0).then_some(value as u64)
}

/// Faucet service
pub struct FaucetService {
    dispatcher: Arc<ClaimDispatcher>,
}

impl FaucetService {
    pub fn new(dispatcher: Arc<ClaimDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Build the production service: JSON-RPC bindings for every configured network
    pub fn from_config(config: &FaucetConfig) -> FaucetResult<Self> {
        let connector = RpcContractConnector::from_config(config)?;
        let networks = NetworkRegistry::new(config.networks.iter().cloned());
        info!("Supported networks ({}): {:?}", networks.len(), networks.chain_ids());

        let dispatcher = ClaimDispatcher::new(networks, Arc::new(connector));
        Ok(Self::new(Arc::new(dispatcher)))
    }

    pub fn dispatcher(&self) -> &Arc<ClaimDispatcher> {
        &self.dispatcher
    }

    /// Validate and submit a claim
    pub async fn claim_funds(&self, request: FaucetRequest) -> FaucetResult<FaucetResponse> {
        let claim = ClaimRequest::try_from(&request)?;

        let receipt = self.dispatcher.submit(claim.recipient, claim.chain_id).await?;

        Ok(FaucetResponse {
            transaction: receipt.transaction_id,
        })
    }
}
