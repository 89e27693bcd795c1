//! RPC endpoint configuration
//!
//! Supports two configuration methods:
//! 1. Per-network env vars (RSK_TESTNET_RPC_URL, RSK_RPC_URL) - highest priority
//! 2. Public RSK nodes - rate limited, fine for testnet use
//!
//! # Examples
//!
//! ```bash
//! # Option 1: explicit node (recommended for production)
//! export RSK_TESTNET_RPC_URL="https://rpc.testnet.rootstock.io/YOUR_KEY"
//!
//! # Option 2: no env vars - uses the public nodes
//! ```

use std::collections::HashMap;

use super::Network;

/// RPC configuration per network
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// RPC URLs indexed by chain ID
    urls: HashMap<u64, String>,
}

/// Environment variable names
mod env_vars {
    pub const RSK_TESTNET_RPC_URL: &str = "RSK_TESTNET_RPC_URL";
    pub const RSK_RPC_URL: &str = "RSK_RPC_URL";
}

/// Public RSK nodes (rate limited)
mod public_rpcs {
    pub const RSK_TESTNET: &str = "https://public-node.testnet.rsk.co/";
    pub const RSK_MAINNET: &str = "https://public-node.rsk.co/";
}

impl RpcConfig {
    /// Create RPC config from environment variables, falling back to the
    /// public nodes for any network left unconfigured.
    pub fn from_env() -> Self {
        let mut urls = HashMap::new();

        if let Ok(url) = std::env::var(env_vars::RSK_TESTNET_RPC_URL) {
            tracing::debug!("Using RSK_TESTNET_RPC_URL for RSK testnet");
            urls.insert(Network::RskTestnet.chain_id(), url);
        }
        if let Ok(url) = std::env::var(env_vars::RSK_RPC_URL) {
            tracing::debug!("Using RSK_RPC_URL for RSK mainnet");
            urls.insert(Network::RskMainnet.chain_id(), url);
        }

        if !urls.contains_key(&Network::RskTestnet.chain_id()) {
            tracing::debug!("No RPC configured for RSK testnet, using public node (rate limited)");
        }
        urls.entry(Network::RskTestnet.chain_id())
            .or_insert_with(|| public_rpcs::RSK_TESTNET.to_string());
        urls.entry(Network::RskMainnet.chain_id())
            .or_insert_with(|| public_rpcs::RSK_MAINNET.to_string());

        Self { urls }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<u64, String>) -> Self {
        Self { urls }
    }

    /// Get RPC URL for a chain
    pub fn get(&self, chain_id: u64) -> Option<&str> {
        self.urls.get(&chain_id).map(|s| s.as_str())
    }

    /// Get RPC URL for a network
    pub fn for_network(&self, network: Network) -> Option<&str> {
        self.get(network.chain_id())
    }

    /// Check if a chain is configured
    pub fn has_chain(&self, chain_id: u64) -> bool {
        self.urls.contains_key(&chain_id)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
