//! Claim dispatcher: binds a claim to its network and runs it through the queue

use crate::address::{parse_address, to_hex, Address};
use crate::contract::{ContractConnector, FaucetContract};
use crate::error::{FaucetError, FaucetResult};
use crate::metrics::{record_claim, BINDING_CONSTRUCTIONS_TOTAL};
use crate::network::{NetworkConfig, NetworkRegistry};
use crate::queue::ClaimQueue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Successful claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub transaction_id: String,
}

/// Routes claims to the per-network faucet contract and serializes them
pub struct ClaimDispatcher {
    queue: Arc<ClaimQueue>,
    networks: NetworkRegistry,
    connector: Arc<dyn ContractConnector>,
    /// One binding per chain id, built on first use. Failed builds are not cached.
    bindings: moka::sync::Cache<u64, Arc<dyn FaucetContract>>,
}

impl ClaimDispatcher {
    pub fn new(networks: NetworkRegistry, connector: Arc<dyn ContractConnector>) -> Self {
        Self::with_queue(Arc::new(ClaimQueue::new()), networks, connector)
    }

    pub fn with_queue(
        queue: Arc<ClaimQueue>,
        networks: NetworkRegistry,
        connector: Arc<dyn ContractConnector>,
    ) -> Self {
        Self {
            queue,
            networks,
            connector,
            bindings: moka::sync::Cache::builder().build(),
        }
    }

    pub fn queue(&self) -> &Arc<ClaimQueue> {
        &self.queue
    }

    /// Cached binding for `chain_id`, constructing it on first use
    pub fn binding(&self, chain_id: u64) -> FaucetResult<Arc<dyn FaucetContract>> {
        let network = self
            .networks
            .get(chain_id)
            .ok_or_else(|| FaucetError::unsupported_network(chain_id))?;

        // Concurrent first uses of the same chain id share a single construction.
        self.bindings
            .try_get_with(chain_id, || self.build_binding(network))
            .map_err(|e| (*e).clone())
    }

    fn build_binding(&self, network: &NetworkConfig) -> FaucetResult<Arc<dyn FaucetContract>> {
        let raw_address = network
            .contract_address()
            .ok_or_else(|| FaucetError::missing_contract(network.chain_id))?;
        let contract_address = parse_address(raw_address).ok_or_else(|| {
            FaucetError::Configuration(format!(
                "invalid faucet contract address for network {}",
                network.chain_id
            ))
        })?;

        let binding = self.connector.connect(network, contract_address)?;

        BINDING_CONSTRUCTIONS_TOTAL
            .with_label_values(&[network.name.as_str()])
            .inc();
        info!(
            "Faucet contract {} bound on {} ({})",
            to_hex(&contract_address),
            network.name,
            network.chain_id
        );
        Ok(binding)
    }

    /// Submit a claim for `recipient` on `chain_id`.
    ///
    /// Configuration problems fail before anything is enqueued.
    pub async fn submit(&self, recipient: Address, chain_id: u64) -> FaucetResult<ClaimReceipt> {
        let binding = self.binding(chain_id)?;
        let network_name = self
            .networks
            .get(chain_id)
            .map(|n| n.name.clone())
            .unwrap_or_default();

        let label = format!("claim({})", to_hex(&recipient));
        let ticket = self.queue.enqueue_named(label, move || async move {
            binding.claim_funds(recipient).await
        });

        match ticket.await {
            Ok(submitted) => {
                record_claim(&network_name, true);
                Ok(ClaimReceipt {
                    transaction_id: submitted.transaction_id,
                })
            }
            Err(e) => {
                record_claim(&network_name, false);
                warn!("Claim for {} on {} failed: {}", to_hex(&recipient), network_name, e);
                Err(FaucetError::from(e))
            }
        }
    }
}
