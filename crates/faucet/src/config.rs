//! Faucet configuration

use crate::error::{FaucetError, FaucetResult};
use crate::logging::LoggingConfig;
use crate::network::{default_networks, NetworkConfig};
use ::config::{Config, File};
use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_SERVER_PORT: u16 = 3001;

/// Faucet service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// Server address
    pub server_addr: String,

    /// CORS allow-list; empty or `*` allows any origin
    pub allowed_origins: Vec<String>,

    /// Faucet account private key, shared by every network
    pub private_key: Option<String>,

    /// Token substituted into Infura endpoint templates
    pub infura_token: Option<String>,

    /// Supported networks
    pub networks: Vec<NetworkConfig>,

    /// Receipt polling interval while waiting for confirmation
    pub confirmation_poll_interval_ms: u64,

    /// Gas limit used when the node cannot estimate one
    pub gas_limit: u64,

    pub logging: LoggingConfig,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("0.0.0.0:{}", DEFAULT_SERVER_PORT),
            allowed_origins: Vec::new(),
            private_key: None,
            infura_token: None,
            networks: default_networks(),
            confirmation_poll_interval_ms: 4000,
            gas_limit: 100_000,
            logging: LoggingConfig::default(),
        }
    }
}

impl FaucetConfig {
    /// Load from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load from a config file (TOML, YAML, JSON...), then apply the environment on top
    pub fn from_file(path: &str) -> FaucetResult<Self> {
        let mut config = Config::builder()
            .add_source(File::with_name(path))
            .build()
            .and_then(|settings| settings.try_deserialize::<FaucetConfig>())
            .map_err(|e| FaucetError::Configuration(format!("failed to load {}: {}", path, e)))?;

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("SERVER_PORT") {
            self.server_addr = format!("0.0.0.0:{}", port.trim());
        }

        // FRONTEND_ORGIN is the name older deployments used
        if let Some(origins) = lookup("FRONTEND_ORIGIN").or_else(|| lookup("FRONTEND_ORGIN")) {
            self.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(key) = lookup("PRIVATE_KEY") {
            self.private_key = Some(key);
        }

        if let Some(token) = lookup("INFURA_TOKEN") {
            self.infura_token = Some(token);
        }

        if let Some(interval) = lookup("FAUCET_CONFIRMATION_POLL_MS") {
            parse_env_number("FAUCET_CONFIRMATION_POLL_MS", &interval, &mut self.confirmation_poll_interval_ms);
        }

        if let Some(gas_limit) = lookup("FAUCET_GAS_LIMIT") {
            parse_env_number("FAUCET_GAS_LIMIT", &gas_limit, &mut self.gas_limit);
        }

        if let Some(format) = lookup("FAUCET_LOG_FORMAT") {
            self.logging.format = format;
        }

        for network in &mut self.networks {
            if let Some(address) = network.contract_address_env.as_deref().and_then(&lookup) {
                network.contract_address = Some(address);
            }
        }
    }

    /// Check start-up requirements; a missing or malformed key is fatal
    pub fn validate(&self) -> FaucetResult<()> {
        let key = self
            .private_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| FaucetError::Configuration("PRIVATE_KEY is not set".to_string()))?;

        let hex_key = key.strip_prefix("0x").unwrap_or(key);
        let bytes = hex::decode(hex_key)
            .map_err(|e| FaucetError::Configuration(format!("invalid PRIVATE_KEY: {}", e)))?;
        if bytes.len() != 32 {
            return Err(FaucetError::Configuration(format!(
                "invalid PRIVATE_KEY: expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        if self.networks.is_empty() {
            return Err(FaucetError::Configuration("no networks configured".to_string()));
        }

        // An allow-list with unusable entries would silently block every origin
        if let Some(origin) = self
            .allowed_origins
            .iter()
            .find(|o| o.as_str() != "*" && o.parse::<HeaderValue>().is_err())
        {
            return Err(FaucetError::Configuration(format!(
                "invalid allowed origin {:?}",
                origin
            )));
        }

        Ok(())
    }

    /// Get confirmation polling interval
    pub fn confirmation_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_interval_ms.max(1))
    }
}

/// Keep `target` unchanged when `raw` is not a valid number
fn parse_env_number<T: FromStr + std::fmt::Display>(name: &str, raw: &str, target: &mut T) {
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!("Ignoring invalid {}={:?}, keeping {}", name, raw, target),
    }
}
