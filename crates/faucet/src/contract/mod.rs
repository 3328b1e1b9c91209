//! Network client capability: submit a faucet claim and wait for it to be mined

pub mod faucet_contract;
pub mod rpc_client;
pub mod signer;

use crate::address::Address;
use crate::error::{FaucetResult, NetworkError};
use crate::network::NetworkConfig;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

pub use faucet_contract::{encode_claim_funds, RpcContractConnector, RpcFaucetContract};
pub use rpc_client::{decode_revert_reason, JsonRpcClient};
pub use signer::{FaucetSigner, LegacyTransaction};

/// Settles once the network reports the transaction mined, or fails
pub type Confirmation = BoxFuture<'static, Result<(), NetworkError>>;

/// A submitted transaction
pub struct TransactionHandle {
    /// Network-assigned transaction id; may be empty
    pub id: String,
    confirmation: Confirmation,
}

impl TransactionHandle {
    pub fn new<F>(id: impl Into<String>, confirmation: F) -> Self
    where
        F: Future<Output = Result<(), NetworkError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            confirmation: confirmation.boxed(),
        }
    }

    /// Handle whose confirmation is already settled
    pub fn confirmed(id: impl Into<String>) -> Self {
        Self::new(id, futures::future::ready(Ok(())))
    }

    pub fn into_parts(self) -> (String, Confirmation) {
        (self.id, self.confirmation)
    }

    pub async fn wait_for_confirmation(self) -> Result<(), NetworkError> {
        self.confirmation.await
    }
}

impl std::fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHandle").field("id", &self.id).finish()
    }
}

/// Faucet contract bound to one network and the faucet signer
#[async_trait]
pub trait FaucetContract: Send + Sync {
    async fn claim_funds(&self, recipient: Address) -> Result<TransactionHandle, NetworkError>;
}

/// Builds the contract binding for a network
pub trait ContractConnector: Send + Sync {
    fn connect(
        &self,
        network: &NetworkConfig,
        contract_address: Address,
    ) -> FaucetResult<Arc<dyn FaucetContract>>;
}
