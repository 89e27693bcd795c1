//! Local-key provider implementation
//!
//! SECURITY: this is the only place where private keys exist.
//! - Keys are held in alloy's signer types, which handle crypto securely
//! - Keys are never serialized and never logged
//! - The env var is read into a `SecretString` and dropped after parsing

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::{ConfirmationConfig, PRIVATE_KEY_ENV};
use crate::provider::{InjectedProvider, MintSigner, ProviderError};

/// Wallet provider backed by a local signing key.
///
/// There is no approval prompt to reject: account requests always grant the
/// single derived account. Submission and confirmation go through the
/// configured RPC node.
pub struct LocalWalletProvider {
    address: Address,
    wallet: EthereumWallet,
    rpc_url: Url,
    confirmation: ConfirmationConfig,
}

impl LocalWalletProvider {
    /// Create a provider from the PRIVATE_KEY environment variable.
    pub fn from_env(rpc_url: &str, confirmation: ConfirmationConfig) -> crate::Result<Self> {
        let key: SecretString = std::env::var(PRIVATE_KEY_ENV)
            .map(SecretString::from)
            .map_err(|_| {
                crate::Error::Config(format!(
                    "environment variable {PRIVATE_KEY_ENV} not set; required for wallet initialization"
                ))
            })?;
        Self::from_hex(key.expose_secret(), rpc_url, confirmation)
    }

    /// Create a provider from a hex-encoded private key.
    pub fn from_hex(
        key_hex: &str,
        rpc_url: &str,
        confirmation: ConfirmationConfig,
    ) -> crate::Result<Self> {
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| crate::Error::Config(format!("invalid private key: {e}")))?;
        let rpc_url: Url = rpc_url
            .parse()
            .map_err(|e| crate::Error::Config(format!("invalid rpc url: {e}")))?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        Ok(Self {
            address,
            wallet,
            rpc_url,
            confirmation,
        })
    }

    /// Public address derived from the key (safe to share)
    pub fn address(&self) -> Address {
        self.address
    }
}

// Implement Debug manually so key material can never leak through logs
impl std::fmt::Debug for LocalWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWalletProvider")
            .field("address", &self.address)
            .field("rpc_url", &self.rpc_url.as_str())
            .field("wallet", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl InjectedProvider for LocalWalletProvider {
    fn is_available(&self) -> bool {
        true
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        // A local key has no permission prompt; the single account is
        // granted unconditionally.
        Ok(vec![self.address])
    }

    async fn signer(&self) -> Result<Arc<dyn MintSigner>, ProviderError> {
        Ok(Arc::new(LocalSigner {
            address: self.address,
            wallet: self.wallet.clone(),
            rpc_url: self.rpc_url.clone(),
            confirmation: self.confirmation.clone(),
        }))
    }
}

struct LocalSigner {
    address: Address,
    wallet: EthereumWallet,
    rpc_url: Url,
    confirmation: ConfirmationConfig,
}

#[async_trait]
impl MintSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<TxHash, ProviderError> {
        let provider = ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .connect_http(self.rpc_url.clone());

        let tx = TransactionRequest::default()
            .from(self.address)
            .to(to)
            .input(calldata.into());

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| classify_send_error(&e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<(), ProviderError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let interval = Duration::from_millis(self.confirmation.poll_interval_ms);

        for _ in 0..self.confirmation.max_polls {
            match provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    return if receipt.status() {
                        Ok(())
                    } else {
                        Err(ProviderError::Reverted(
                            "transaction reverted on-chain".to_string(),
                        ))
                    };
                }
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Receipt not yet available");
                }
                Err(e) => return Err(ProviderError::Rpc(e.to_string())),
            }
            tokio::time::sleep(interval).await;
        }

        Err(ProviderError::ConfirmationTimeout(self.confirmation.max_polls))
    }
}

/// Map an RPC send error onto the provider taxonomy, pulling out revert
/// reasons where the node includes them.
fn classify_send_error(error: &str) -> ProviderError {
    if error.contains("execution reverted") {
        ProviderError::Reverted(parse_revert_reason(error))
    } else {
        ProviderError::Rpc(error.to_string())
    }
}

/// Parse a revert reason from an RPC error message
fn parse_revert_reason(error: &str) -> String {
    if let Some(start) = error.find("revert: ") {
        let reason = &error[start + 8..];
        if let Some(end) = reason.find('"') {
            return reason[..end].to_string();
        }
        return reason.to_string();
    }

    // Try to decode an Error(string) payload (selector 0x08c379a0)
    if let Some(start) = error.find("0x08c379a0") {
        let hex_data = &error[start..];
        let end = hex_data
            .find(|c: char| !c.is_ascii_hexdigit() && c != 'x')
            .unwrap_or(hex_data.len());
        let hex = &hex_data[..end];
        if hex.len() > 138 {
            if let Ok(decoded) = alloy::hex::decode(&hex[138..]) {
                let filtered: Vec<u8> = decoded.into_iter().filter(|&b| b != 0).collect();
                if let Ok(reason) = String::from_utf8(filtered) {
                    return reason;
                }
            }
        }
        return format!("reverted with data: {hex}");
    }

    "execution reverted".to_string()
}
