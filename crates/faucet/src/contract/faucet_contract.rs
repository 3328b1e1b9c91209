//! JSON-RPC backed faucet contract binding

use super::rpc_client::JsonRpcClient;
use super::signer::{FaucetSigner, LegacyTransaction};
use super::{ContractConnector, FaucetContract, TransactionHandle};
use crate::address::{to_hex, Address};
use crate::config::FaucetConfig;
use crate::error::{FaucetError, FaucetResult, NetworkError};
use crate::network::NetworkConfig;
use async_trait::async_trait;
use ethabi::{ParamType, Token};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;

/// Calldata for `claimFunds(address)`
pub fn encode_claim_funds(recipient: Address) -> Vec<u8> {
    let mut data = ethabi::short_signature("claimFunds", &[ParamType::Address]).to_vec();
    data.extend(ethabi::encode(&[Token::Address(recipient)]));
    data
}

/// Faucet contract on one network, signing with the shared faucet key
pub struct RpcFaucetContract {
    chain_id: u64,
    contract_address: Address,
    client: Arc<JsonRpcClient>,
    signer: Arc<FaucetSigner>,
    fallback_gas_limit: u64,
    poll_interval: Duration,
}

impl RpcFaucetContract {
    pub fn new(
        chain_id: u64,
        contract_address: Address,
        client: Arc<JsonRpcClient>,
        signer: Arc<FaucetSigner>,
        fallback_gas_limit: u64,
        poll_interval: Duration,
    ) -> Self {
        Self {
            chain_id,
            contract_address,
            client,
            signer,
            fallback_gas_limit,
            poll_interval,
        }
    }

    async fn estimate_gas(&self, data: &[u8]) -> Result<u64, NetworkError> {
        let call = serde_json::json!({
            "from": to_hex(&self.signer.address()),
            "to": to_hex(&self.contract_address),
            "data": format!("0x{}", hex::encode(data)),
        });

        match self.client.estimate_gas(call).await {
            Ok(gas) => Ok(gas),
            Err(e) if e.code == Some(METHOD_NOT_FOUND) => {
                warn!(
                    "eth_estimateGas unsupported on chain {}, using gas limit {}",
                    self.chain_id, self.fallback_gas_limit
                );
                Ok(self.fallback_gas_limit)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl FaucetContract for RpcFaucetContract {
    async fn claim_funds(&self, recipient: Address) -> Result<TransactionHandle, NetworkError> {
        let data = encode_claim_funds(recipient);

        let nonce = self
            .client
            .get_transaction_count(&self.signer.address(), "pending")
            .await?;
        let gas_price = self.client.gas_price().await?;
        let gas_limit = self.estimate_gas(&data).await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to: self.contract_address,
            value: 0,
            data,
        };
        debug!("claimFunds({}) nonce={} gas={} chain={}", to_hex(&recipient), nonce, gas_limit, self.chain_id);

        let raw_tx = self.signer.sign_legacy(&tx, self.chain_id)?;
        let tx_hash = self.client.send_raw_transaction(&raw_tx).await?;
        info!("Transaction sent on chain {}: {}", self.chain_id, tx_hash);

        let confirmation = wait_for_receipt(self.client.clone(), tx_hash.clone(), self.poll_interval);
        Ok(TransactionHandle::new(tx_hash, confirmation))
    }
}

/// Poll until the receipt appears; no timeout
async fn wait_for_receipt(
    client: Arc<JsonRpcClient>,
    tx_hash: String,
    poll_interval: Duration,
) -> Result<(), NetworkError> {
    loop {
        if let Some(receipt) = client.get_transaction_receipt(&tx_hash).await? {
            let status = receipt.get("status").and_then(|s| s.as_str());
            if status == Some("0x0") {
                return Err(NetworkError::with_reason(
                    format!("transaction {} reverted", tx_hash),
                    "transaction reverted",
                ));
            }
            debug!("Transaction {} mined", tx_hash);
            return Ok(());
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Builds `RpcFaucetContract` bindings from network configuration
pub struct RpcContractConnector {
    signer: Arc<FaucetSigner>,
    infura_token: Option<String>,
    fallback_gas_limit: u64,
    poll_interval: Duration,
}

impl RpcContractConnector {
    pub fn new(signer: Arc<FaucetSigner>, infura_token: Option<String>) -> Self {
        Self {
            signer,
            infura_token,
            fallback_gas_limit: FaucetConfig::default().gas_limit,
            poll_interval: FaucetConfig::default().confirmation_poll_interval(),
        }
    }

    pub fn from_config(config: &FaucetConfig) -> FaucetResult<Self> {
        let private_key = config
            .private_key
            .as_deref()
            .ok_or_else(|| FaucetError::Configuration("PRIVATE_KEY is not set".to_string()))?;
        let signer = Arc::new(FaucetSigner::from_hex(private_key)?);
        info!("Faucet address: {}", crate::address::to_checksum(&signer.address()));

        Ok(Self {
            signer,
            infura_token: config.infura_token.clone(),
            fallback_gas_limit: config.gas_limit,
            poll_interval: config.confirmation_poll_interval(),
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl ContractConnector for RpcContractConnector {
    fn connect(
        &self,
        network: &NetworkConfig,
        contract_address: Address,
    ) -> FaucetResult<Arc<dyn FaucetContract>> {
        let endpoint = network.endpoint(self.infura_token.as_deref());
        let client = Arc::new(JsonRpcClient::new(endpoint));

        Ok(Arc::new(RpcFaucetContract::new(
            network.chain_id,
            contract_address,
            client,
            self.signer.clone(),
            self.fallback_gas_limit,
            self.poll_interval,
        )))
    }
}
