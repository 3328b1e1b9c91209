//! Multi-network faucet service
//!
//! Dispenses funds from one shared faucet account to arbitrary recipients on
//! several EVM networks. Claims are signed by the same key, so they pass
//! through a single ordered queue that waits for each transaction to be mined
//! before submitting the next one.

pub mod address;
pub mod api;
pub mod config;
pub mod contract;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod network;
pub mod queue;
pub mod service;

pub use config::FaucetConfig;
pub use contract::{ContractConnector, FaucetContract, TransactionHandle};
pub use dispatcher::{ClaimDispatcher, ClaimReceipt};
pub use error::{FaucetError, FaucetResult, NetworkError};
pub use network::{NetworkConfig, NetworkRegistry};
pub use queue::{ClaimQueue, ClaimTicket, SlotError, SubmittedClaim};
pub use service::{FaucetRequest, FaucetResponse, FaucetService};
