//! Configuration for the mint agent
//!
//! The deployment scripts write the deployed GameAssetNFT address into a
//! shared record after each network deployment; this crate only consumes
//! the resulting fixed address, it never writes it.

pub mod rpc;

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use rpc::RpcConfig;

/// Env override for the deployed contract address
pub const CONTRACT_ADDRESS_ENV: &str = "MINT_CONTRACT_ADDRESS";
/// Env var holding the signing key for the local wallet provider
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// GameAssetNFT deployment recorded by the deploy scripts on RSK testnet.
pub const DEFAULT_CONTRACT_ADDRESS: Address =
    address!("C72181EFF28f9Fe95CbF10Cc415a1Bb0608fc6Bd");

/// Supported networks. One network per process instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    RskTestnet,
    RskMainnet,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::RskTestnet => 31,
            Network::RskMainnet => 30,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::RskTestnet => "rsk_testnet",
            Network::RskMainnet => "rsk_mainnet",
        }
    }
}

/// Confirmation polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Milliseconds between receipt polls
    pub poll_interval_ms: u64,
    /// Give up after this many polls
    pub max_polls: u32,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        // RSK targets ~30s blocks; five minutes of polling covers a couple
        // of slow blocks without hanging a session forever.
        Self {
            poll_interval_ms: 5_000,
            max_polls: 60,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintConfig {
    /// Network the contract is deployed on
    pub network: Network,
    /// Deployed GameAssetNFT address
    pub contract_address: Address,
    /// Confirmation polling settings
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
}

impl MintConfig {
    /// Build configuration from the environment, falling back to the
    /// recorded testnet deployment.
    pub fn from_env() -> Self {
        let contract_address = match std::env::var(CONTRACT_ADDRESS_ENV) {
            Ok(raw) => match raw.parse() {
                Ok(address) => address,
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed {CONTRACT_ADDRESS_ENV}");
                    DEFAULT_CONTRACT_ADDRESS
                }
            },
            Err(_) => DEFAULT_CONTRACT_ADDRESS,
        };

        Self {
            network: Network::RskTestnet,
            contract_address,
            confirmation: ConfirmationConfig::default(),
        }
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Default for MintConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
