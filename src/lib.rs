//! Game asset mint agent
//!
//! Connects a wallet provider and submits a single on-chain action: minting
//! a GameAssetNFT token for a recipient. Three pieces cooperate:
//!
//! - a provider adapter over the wallet boundary (`provider`, with a
//!   local-key implementation in `wallet`)
//! - a session manager owning the connection state machine (`session`)
//! - a transaction controller tracking one mint from submission through
//!   confirmation or failure (`mint`)
//!
//! The wallet provider is an explicit dependency handed in at construction
//! rather than ambient global state, so tests can substitute a scripted
//! fake without touching the environment.

pub mod config;
pub mod contract;
pub mod mint;
pub mod provider;
pub mod service;
pub mod session;
pub mod wallet;

mod error;

#[cfg(test)]
pub mod test_harness;

// Re-export commonly used types
pub use config::{MintConfig, Network, RpcConfig};
pub use error::{Error, Result};
pub use mint::{MintController, MintError, MintRequest, TransactionRecord, TxState};
pub use service::MintService;
pub use session::{ConnectError, SessionManager, SessionStatus, WalletSession};
