//! Scripted wallet fakes for state-machine tests.
//!
//! `FakeProvider` stands in for the injected wallet: approvals can be
//! granted immediately, rejected, or held open on a gate so tests can
//! observe the Connecting state. `FakeSigner` replays queued outcomes for
//! each mint call and counts every on-chain submission it is asked to make,
//! so tests can assert that rejected paths issue zero calls.

use alloy::primitives::{address, Address, Bytes, TxHash};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::provider::{InjectedProvider, MintSigner, ProviderError};

pub const ALICE: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
pub const BOB: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
pub const CONTRACT: Address = crate::config::DEFAULT_CONTRACT_ADDRESS;

/// What a queued mint call should do.
#[derive(Debug, Clone)]
pub enum MintOutcome {
    /// Accept the submission and confirm successfully.
    Confirm,
    /// Accept the submission, then revert during confirmation.
    Revert(String),
    /// Refuse the submission outright; no transaction is broadcast.
    RejectSubmission(String),
    /// Accept the submission and hold confirmation until released.
    HoldConfirmation,
}

/// Signer fake replaying queued outcomes. Unqueued calls confirm.
pub struct FakeSigner {
    address: Address,
    outcomes: Mutex<VecDeque<MintOutcome>>,
    pending: Mutex<HashMap<TxHash, MintOutcome>>,
    sent: AtomicU32,
    next_hash: AtomicU32,
    release: Notify,
}

impl FakeSigner {
    pub fn new(address: Address) -> Arc<Self> {
        Arc::new(Self {
            address,
            outcomes: Mutex::new(VecDeque::new()),
            pending: Mutex::new(HashMap::new()),
            sent: AtomicU32::new(0),
            next_hash: AtomicU32::new(0),
            release: Notify::new(),
        })
    }

    pub fn queue(&self, outcome: MintOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Number of on-chain submissions the network accepted.
    pub fn sent_calls(&self) -> u32 {
        self.sent.load(Ordering::SeqCst)
    }

    /// Release one held confirmation.
    pub fn release_confirmation(&self) {
        self.release.notify_one();
    }

    fn fresh_hash(&self) -> TxHash {
        let n = self.next_hash.fetch_add(1, Ordering::SeqCst) + 1;
        let mut bytes = [0u8; 32];
        bytes[28..].copy_from_slice(&n.to_be_bytes());
        TxHash::from(bytes)
    }
}

#[async_trait]
impl MintSigner for FakeSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_call(&self, _to: Address, _calldata: Bytes) -> Result<TxHash, ProviderError> {
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MintOutcome::Confirm);

        if let MintOutcome::RejectSubmission(reason) = outcome {
            return Err(ProviderError::Rpc(reason));
        }

        self.sent.fetch_add(1, Ordering::SeqCst);
        let tx_hash = self.fresh_hash();
        self.pending.lock().unwrap().insert(tx_hash, outcome);
        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<(), ProviderError> {
        let outcome = self
            .pending
            .lock()
            .unwrap()
            .remove(&tx_hash)
            .unwrap_or(MintOutcome::Confirm);

        match outcome {
            MintOutcome::Revert(reason) => Err(ProviderError::Reverted(reason)),
            MintOutcome::HoldConfirmation => {
                self.release.notified().await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Handle for flipping provider availability after the provider has been
/// moved into a session manager.
#[derive(Clone)]
pub struct ProviderHandle {
    available: Arc<AtomicBool>,
}

impl ProviderHandle {
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

/// Scripted stand-in for the browser-injected wallet provider.
pub struct FakeProvider {
    accounts: Vec<Address>,
    available: Arc<AtomicBool>,
    reject: Option<String>,
    gate: Option<Arc<Notify>>,
    signer: Arc<FakeSigner>,
}

impl FakeProvider {
    /// Provider that approves the prompt with the given accounts.
    pub fn approving(accounts: Vec<Address>) -> Self {
        let address = accounts.first().copied().unwrap_or(ALICE);
        Self {
            accounts,
            available: Arc::new(AtomicBool::new(true)),
            reject: None,
            gate: None,
            signer: FakeSigner::new(address),
        }
    }

    /// Provider whose prompt the user rejects.
    pub fn rejecting(reason: &str) -> Self {
        let mut provider = Self::approving(vec![ALICE]);
        provider.reject = Some(reason.to_string());
        provider
    }

    /// Provider that approves but grants no accounts (locked wallet).
    pub fn empty() -> Self {
        Self::approving(Vec::new())
    }

    /// Provider whose prompt stays open until the gate is notified.
    pub fn gated(accounts: Vec<Address>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut provider = Self::approving(accounts);
        provider.gate = Some(Arc::clone(&gate));
        (provider, gate)
    }

    /// The signer this provider hands out, for scripting and assertions.
    pub fn signer(&self) -> Arc<FakeSigner> {
        Arc::clone(&self.signer)
    }

    /// Availability toggle that outlives the provider value.
    pub fn handle(&self) -> ProviderHandle {
        ProviderHandle {
            available: Arc::clone(&self.available),
        }
    }
}

#[async_trait]
impl InjectedProvider for FakeProvider {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::Unavailable);
        }
        if let Some(gate) = &self.gate {
            // The prompt is open; the "user" decides when it resolves.
            gate.notified().await;
        }
        if let Some(reason) = &self.reject {
            return Err(ProviderError::UserRejected(reason.clone()));
        }
        if self.accounts.is_empty() {
            return Err(ProviderError::NoAccounts);
        }
        Ok(self.accounts.clone())
    }

    async fn signer(&self) -> Result<Arc<dyn MintSigner>, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::Unavailable);
        }
        let signer: Arc<dyn MintSigner> = self.signer.clone();
        Ok(signer)
    }
}
