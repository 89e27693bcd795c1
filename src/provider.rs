//! Wallet provider boundary
//!
//! In a browser the wallet object is ambient, mutable global state looked up
//! on `window`. Here it is an explicit dependency handed to the session
//! manager at construction, so tests substitute a scripted fake and headless
//! deployments plug in a local-key implementation.
//!
//! Absence of a provider is a normal, expected condition (no wallet
//! installed), not a fatal error. The provider object is owned by the host
//! environment and can disappear between calls; callers must tolerate
//! `is_available` flipping to false at any time.

use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("wallet provider is unavailable")]
    Unavailable,

    #[error("account access rejected: {0}")]
    UserRejected(String),

    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("no receipt after {0} polls")]
    ConfirmationTimeout(u32),
}

/// Account access and signer acquisition for one wallet.
///
/// `request_accounts` triggers the wallet's native permission prompt, a
/// user-facing and potentially long-blocking interaction outside this
/// crate's control. A rejected prompt is terminal for that attempt; there is
/// no retry logic here, callers retry by calling it again.
#[async_trait]
pub trait InjectedProvider: Send + Sync {
    /// Whether the provider is currently reachable.
    fn is_available(&self) -> bool;

    /// Request account access, returning addresses in wallet order.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Obtain a signer bound to the currently selected account.
    async fn signer(&self) -> Result<Arc<dyn MintSigner>, ProviderError>;
}

/// A handle bound to one account, able to authorize state-changing calls.
///
/// Submission acknowledgment and confirmation are distinct events: the
/// network accepting a transaction and assigning a hash says nothing about
/// whether it will be mined.
#[async_trait]
pub trait MintSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Submit a state-changing call. Returns once the network has accepted
    /// the transaction; this is not confirmation.
    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<TxHash, ProviderError>;

    /// Wait until the transaction is mined, failing on an on-chain revert.
    async fn confirm(&self, tx_hash: TxHash) -> Result<(), ProviderError>;
}
