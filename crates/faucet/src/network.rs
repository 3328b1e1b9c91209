//! Supported networks and their RPC endpoint templates

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const RINKEBY_CHAIN_ID: u64 = 4;
pub const GOERLI_CHAIN_ID: u64 = 5;
pub const GNOSIS_CHAIN_ID: u64 = 100;

/// Placeholder substituted with the configured Infura token
pub const INFURA_TOKEN_PLACEHOLDER: &str = "{infura_token}";

/// Static configuration of one supported network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// EIP-155 chain id
    pub chain_id: u64,

    /// Human readable name, also used as the metrics label
    pub name: String,

    /// RPC endpoint template
    pub rpc_url: String,

    /// Faucet contract deployed on this network
    #[serde(default)]
    pub contract_address: Option<String>,

    /// Environment variable that supplies `contract_address`
    #[serde(default)]
    pub contract_address_env: Option<String>,
}

impl NetworkConfig {
    pub fn new(chain_id: u64, name: &str, rpc_url: &str, contract_address_env: &str) -> Self {
        Self {
            chain_id,
            name: name.to_string(),
            rpc_url: rpc_url.to_string(),
            contract_address: None,
            contract_address_env: Some(contract_address_env.to_string()),
        }
    }

    /// RPC endpoint with the API token filled in
    pub fn endpoint(&self, infura_token: Option<&str>) -> String {
        self.rpc_url
            .replace(INFURA_TOKEN_PLACEHOLDER, infura_token.unwrap_or_default())
    }

    /// Configured contract address, ignoring blank values
    pub fn contract_address(&self) -> Option<&str> {
        self.contract_address
            .as_deref()
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
    }
}

/// Networks of the reference deployment
pub fn default_networks() -> Vec<NetworkConfig> {
    vec![
        NetworkConfig::new(
            RINKEBY_CHAIN_ID,
            "rinkeby",
            "https://rinkeby.infura.io/v3/{infura_token}",
            "FAUCET_CONTRACT_ADDRESS_RINKEBY",
        ),
        NetworkConfig::new(
            GOERLI_CHAIN_ID,
            "goerli",
            "https://goerli.infura.io/v3/{infura_token}",
            "FAUCET_CONTRACT_ADDRESS_GOERLI",
        ),
        NetworkConfig::new(
            GNOSIS_CHAIN_ID,
            "gnosis",
            "https://rpc.gnosischain.com",
            "FAUCET_CONTRACT_ADDRESS_GNOSIS_CHAIN",
        ),
    ]
}

/// Lookup table of supported networks keyed by chain id
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: HashMap<u64, NetworkConfig>,
}

impl NetworkRegistry {
    pub fn new(networks: impl IntoIterator<Item = NetworkConfig>) -> Self {
        Self {
            networks: networks.into_iter().map(|n| (n.chain_id, n)).collect(),
        }
    }

    pub fn get(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks.get(&chain_id)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.networks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
