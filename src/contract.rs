//! Typed handle for the GameAssetNFT contract
//!
//! The ABI fragment is a statically declared operation descriptor rather
//! than a dynamically-typed data value: the pinned selector is re-derived
//! from the method signature when the handle is bound, so a malformed or
//! mismatched descriptor is rejected before any call is attempted instead
//! of failing opaquely at call time.

use alloy::primitives::{keccak256, Address, Bytes, TxHash};
use alloy::sol;
use alloy::sol_types::SolCall;
use std::sync::Arc;
use thiserror::Error;

use crate::provider::{MintSigner, ProviderError};

sol! {
    /// The single state-changing operation this crate invokes.
    function mint(address player, string tokenURI);
}

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("abi descriptor mismatch for {name}: {signature} hashes to 0x{computed}, descriptor pins 0x{pinned}")]
    DescriptorMismatch {
        name: &'static str,
        signature: &'static str,
        pinned: String,
        computed: String,
    },

    #[error("recipient is not a valid address: {0}")]
    InvalidRecipient(String),

    #[error("mint call failed: {0}")]
    Call(#[from] ProviderError),
}

/// Statically declared descriptor for one contract method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub signature: &'static str,
    pub selector: [u8; 4],
}

impl MethodDescriptor {
    /// Verify the pinned selector against the signature hash.
    pub fn validate(&self) -> Result<(), ContractError> {
        let digest = keccak256(self.signature.as_bytes());
        let computed = [digest[0], digest[1], digest[2], digest[3]];
        if computed != self.selector {
            return Err(ContractError::DescriptorMismatch {
                name: self.name,
                signature: self.signature,
                pinned: alloy::hex::encode(self.selector),
                computed: alloy::hex::encode(computed),
            });
        }
        Ok(())
    }
}

/// Descriptor for `mint(address,string)`, pinned to the generated selector.
pub const MINT_METHOD: MethodDescriptor = MethodDescriptor {
    name: "mint",
    signature: "mint(address,string)",
    selector: mintCall::SELECTOR,
};

/// Typed reference to the deployed contract, bound to one signer.
///
/// Clones share the underlying signer handle; the address and descriptor
/// are fixed for the life of the handle.
#[derive(Clone)]
pub struct MintContract {
    address: Address,
    method: MethodDescriptor,
    signer: Arc<dyn MintSigner>,
}

impl MintContract {
    /// Bind a handle to the deployed address, validating the mint
    /// descriptor before any call can be attempted.
    pub fn bind(address: Address, signer: Arc<dyn MintSigner>) -> Result<Self, ContractError> {
        MINT_METHOD.validate()?;
        Ok(Self {
            address,
            method: MINT_METHOD,
            signer,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Address of the account authorizing calls through this handle.
    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    /// Encode and submit the mint call. Returns the assigned transaction
    /// hash once the network accepts the submission.
    ///
    /// Recipient parsing happens here, not in the transaction controller:
    /// address format is the contract layer's concern so the rules cannot
    /// diverge from on-chain validation.
    pub async fn mint(&self, recipient: &str, token_uri: &str) -> Result<TxHash, ContractError> {
        let player: Address = recipient
            .trim()
            .parse()
            .map_err(|_| ContractError::InvalidRecipient(recipient.to_string()))?;

        let call = mintCall {
            player,
            tokenURI: token_uri.to_string(),
        };
        let calldata = Bytes::from(call.abi_encode());

        tracing::debug!(
            contract = %self.address,
            method = self.method.name,
            recipient = %player,
            calldata_len = calldata.len(),
            "Submitting mint call"
        );

        Ok(self.signer.send_call(self.address, calldata).await?)
    }

    /// Wait for a submitted transaction to be mined.
    pub async fn wait_mined(&self, tx_hash: TxHash) -> Result<(), ContractError> {
        Ok(self.signer.confirm(tx_hash).await?)
    }
}

impl std::fmt::Debug for MintContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintContract")
            .field("address", &self.address)
            .field("method", &self.method.name)
            .finish()
    }
}
