//! Wallet session state machine
//!
//! Owns the Disconnected → Connecting → Connected lifecycle and the derived
//! contract handle. Exactly one account and one network per session; the
//! manager hands out defensive snapshots only, so callers cannot mutate
//! session state outside the machine's transitions.

use alloy::primitives::Address;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};

use crate::contract::MintContract;
use crate::provider::{InjectedProvider, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Read-only snapshot of the wallet session.
///
/// `contract` is `Some` if and only if `status` is `Connected`; the manager
/// maintains that invariant across every transition.
#[derive(Debug, Clone)]
pub struct WalletSession {
    pub status: SessionStatus,
    pub account: Option<Address>,
    pub contract: Option<MintContract>,
    /// Bumped on every reset; an in-flight mint compares generations to
    /// detect that its session died underneath it.
    pub generation: u64,
}

impl WalletSession {
    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("no wallet provider is installed")]
    ProviderMissing,

    #[error("account access rejected by the user: {0}")]
    UserRejected(String),

    #[error("wallet returned an empty account set")]
    EmptyAccountSet,

    #[error("a connection attempt is already in progress")]
    AlreadyConnecting,

    #[error("session is already connected")]
    AlreadyConnected,

    #[error("connection failed: {0}")]
    Failed(String),
}

struct SessionState {
    status: SessionStatus,
    account: Option<Address>,
    contract: Option<MintContract>,
    generation: u64,
}

impl SessionState {
    /// Move to a non-Connected status, clearing derived session data so the
    /// handle-iff-Connected invariant holds after every transition.
    fn reset(&mut self, status: SessionStatus) {
        debug_assert!(status != SessionStatus::Connected);
        self.status = status;
        self.account = None;
        self.contract = None;
        self.generation += 1;
    }
}

/// Connection state machine for one wallet session.
pub struct SessionManager {
    provider: Option<Arc<dyn InjectedProvider>>,
    contract_address: Address,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(provider: Option<Arc<dyn InjectedProvider>>, contract_address: Address) -> Self {
        Self {
            provider,
            contract_address,
            state: Mutex::new(SessionState {
                status: SessionStatus::Disconnected,
                account: None,
                contract: None,
                generation: 0,
            }),
        }
    }

    /// Negotiate account access and derive the contract handle.
    ///
    /// Legal only from Disconnected or Failed. The wallet prompt and signer
    /// derivation are suspension points; the state lock is never held across
    /// them, and re-entry while a connect is pending fails with
    /// `AlreadyConnecting` instead of racing the first attempt.
    pub async fn connect(&self) -> Result<WalletSession, ConnectError> {
        let pending_generation = {
            let mut state = self.lock();
            match state.status {
                SessionStatus::Connecting => return Err(ConnectError::AlreadyConnecting),
                SessionStatus::Connected => return Err(ConnectError::AlreadyConnected),
                SessionStatus::Disconnected | SessionStatus::Failed => {
                    state.reset(SessionStatus::Connecting);
                    state.generation
                }
            }
        };

        let provider = match self.provider.as_ref().filter(|p| p.is_available()) {
            Some(provider) => Arc::clone(provider),
            None => {
                warn!("No wallet provider detected");
                self.finish_attempt(pending_generation, SessionStatus::Disconnected);
                return Err(ConnectError::ProviderMissing);
            }
        };

        match self.negotiate(provider, pending_generation).await {
            Ok(session) => Ok(session),
            Err(err) => {
                let status = match &err {
                    // User-facing refusals reset cleanly so a retry does not
                    // have to clear a failed session first.
                    ConnectError::ProviderMissing
                    | ConnectError::UserRejected(_)
                    | ConnectError::EmptyAccountSet => SessionStatus::Disconnected,
                    _ => SessionStatus::Failed,
                };
                self.finish_attempt(pending_generation, status);
                Err(err)
            }
        }
    }

    /// Resolve a finished connect attempt, but only if it still owns the
    /// session; a disconnect issued while the prompt was open takes
    /// precedence over the attempt's outcome.
    fn finish_attempt(&self, pending_generation: u64, status: SessionStatus) {
        let mut state = self.lock();
        if state.status == SessionStatus::Connecting && state.generation == pending_generation {
            state.reset(status);
        }
    }

    async fn negotiate(
        &self,
        provider: Arc<dyn InjectedProvider>,
        pending_generation: u64,
    ) -> Result<WalletSession, ConnectError> {
        info!("Requesting account access");
        let accounts = provider.request_accounts().await.map_err(|e| match e {
            ProviderError::Unavailable => ConnectError::ProviderMissing,
            ProviderError::UserRejected(reason) => ConnectError::UserRejected(reason),
            ProviderError::NoAccounts => ConnectError::EmptyAccountSet,
            other => ConnectError::Failed(other.to_string()),
        })?;

        let account = accounts
            .first()
            .copied()
            .ok_or(ConnectError::EmptyAccountSet)?;
        info!(account = %account, accounts = accounts.len(), "Account access granted");

        let signer = provider
            .signer()
            .await
            .map_err(|e| ConnectError::Failed(format!("signer derivation failed: {e}")))?;

        // The wallet resolves the active account; trust the signer binding
        // over the raw account list ordering.
        let address = signer.address();
        if address != account {
            warn!(requested = %account, bound = %address, "Signer bound to a different account");
        }

        let contract = MintContract::bind(self.contract_address, signer)
            .map_err(|e| ConnectError::Failed(format!("contract binding failed: {e}")))?;

        let mut state = self.lock();
        // Commit only if this attempt still owns the session. A disconnect
        // issued while the prompt was open must not be overwritten by the
        // prompt resolving afterwards.
        if state.status != SessionStatus::Connecting || state.generation != pending_generation {
            warn!("Session was reset while the wallet prompt was open; discarding the connect");
            return Err(ConnectError::Failed(
                "connection attempt was superseded before it completed".to_string(),
            ));
        }
        state.status = SessionStatus::Connected;
        state.account = Some(address);
        state.contract = Some(contract);
        info!(account = %address, contract = %self.contract_address, "Wallet connected");
        Ok(Self::snapshot_of(&state))
    }

    /// Discard the session. Local bookkeeping only; the wallet's actual
    /// permission grant persists with the provider, not this object.
    pub fn disconnect(&self) {
        let mut state = self.lock();
        if state.status != SessionStatus::Disconnected {
            info!("Wallet disconnected");
        }
        state.reset(SessionStatus::Disconnected);
    }

    /// Defensive snapshot of the current session.
    pub fn current_session(&self) -> WalletSession {
        Self::snapshot_of(&self.lock())
    }

    /// Detect a provider that disappeared out from under a live session.
    ///
    /// Called on the next interaction; a Connected session whose provider is
    /// gone moves to Failed.
    pub fn check_provider(&self) {
        if self.provider.as_ref().is_some_and(|p| p.is_available()) {
            return;
        }
        let mut state = self.lock();
        if state.status == SessionStatus::Connected {
            warn!("Wallet provider disappeared; failing the session");
            state.reset(SessionStatus::Failed);
        }
    }

    /// Whether a session captured at `generation` is still the live,
    /// connected session.
    pub fn generation_is_current(&self, generation: u64) -> bool {
        let state = self.lock();
        state.status == SessionStatus::Connected && state.generation == generation
    }

    fn snapshot_of(state: &SessionState) -> WalletSession {
        WalletSession {
            status: state.status,
            account: state.account,
            contract: state.contract.clone(),
            generation: state.generation,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // Session state is plain data; recover it rather than propagate a
        // poison from an unrelated panic.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::{FakeProvider, ALICE, BOB, CONTRACT};
    use std::time::Duration;

    fn assert_invariant(session: &WalletSession) {
        assert_eq!(
            session.contract.is_some(),
            session.status == SessionStatus::Connected,
            "contract handle must be present iff connected, got {:?}",
            session.status
        );
    }

    fn manager_with(provider: FakeProvider) -> SessionManager {
        SessionManager::new(Some(Arc::new(provider)), CONTRACT)
    }

    #[tokio::test]
    async fn connect_without_provider_is_provider_missing() {
        let manager = SessionManager::new(None, CONTRACT);

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, ConnectError::ProviderMissing));

        let session = manager.current_session();
        assert_eq!(session.status, SessionStatus::Disconnected);
        assert_invariant(&session);
    }

    #[tokio::test]
    async fn connect_with_approval_reaches_connected() {
        let manager = manager_with(FakeProvider::approving(vec![ALICE, BOB]));

        let session = manager.connect().await.unwrap();
        assert_eq!(session.status, SessionStatus::Connected);
        assert_eq!(session.account, Some(ALICE));
        assert_invariant(&session);

        let contract = session.contract.unwrap();
        assert_eq!(contract.address(), CONTRACT);
        // The handle authorizes calls as the connected account.
        assert_eq!(contract.signer_address(), ALICE);
    }

    #[tokio::test]
    async fn rejected_prompt_resets_to_disconnected() {
        let manager = manager_with(FakeProvider::rejecting("user denied the request"));

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, ConnectError::UserRejected(_)));

        let session = manager.current_session();
        assert_eq!(session.status, SessionStatus::Disconnected);
        assert_invariant(&session);
    }

    #[tokio::test]
    async fn empty_account_set_resets_to_disconnected() {
        let manager = manager_with(FakeProvider::empty());

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, ConnectError::EmptyAccountSet));
        assert_eq!(manager.current_session().status, SessionStatus::Disconnected);
    }

    #[tokio::test]
    async fn connect_while_connected_is_rejected() {
        let manager = manager_with(FakeProvider::approving(vec![ALICE]));
        manager.connect().await.unwrap();

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, ConnectError::AlreadyConnected));
        // The live session is untouched.
        assert_eq!(manager.current_session().status, SessionStatus::Connected);
    }

    #[tokio::test]
    async fn concurrent_connect_is_rejected_not_raced() {
        let (provider, gate) = FakeProvider::gated(vec![ALICE]);
        let manager = Arc::new(manager_with(provider));

        let first = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.connect().await })
        };

        // Let the first attempt reach the held prompt.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(manager.current_session().status, SessionStatus::Connecting);

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, ConnectError::AlreadyConnecting));

        gate.notify_one();
        let session = first.await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Connected);
        assert_eq!(session.account, Some(ALICE));
    }

    #[tokio::test]
    async fn disconnect_during_prompt_discards_the_pending_connect() {
        let (provider, gate) = FakeProvider::gated(vec![ALICE]);
        let manager = Arc::new(manager_with(provider));

        let pending = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.connect().await })
        };

        // Let the attempt reach the held prompt, then walk away from it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(manager.current_session().status, SessionStatus::Connecting);
        manager.disconnect();

        // The prompt resolving afterwards must not resurrect the session.
        gate.notify_one();
        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, ConnectError::Failed(_)));

        let session = manager.current_session();
        assert_eq!(session.status, SessionStatus::Disconnected);
        assert_invariant(&session);
    }

    #[tokio::test]
    async fn disconnect_resets_from_any_state() {
        let manager = manager_with(FakeProvider::approving(vec![ALICE]));
        manager.connect().await.unwrap();

        manager.disconnect();
        let session = manager.current_session();
        assert_eq!(session.status, SessionStatus::Disconnected);
        assert_invariant(&session);

        // Idempotent from Disconnected.
        manager.disconnect();
        assert_eq!(manager.current_session().status, SessionStatus::Disconnected);
    }

    #[tokio::test]
    async fn connect_is_legal_again_after_disconnect() {
        let manager = manager_with(FakeProvider::approving(vec![ALICE]));
        manager.connect().await.unwrap();
        manager.disconnect();

        let session = manager.connect().await.unwrap();
        assert_eq!(session.status, SessionStatus::Connected);
    }

    #[tokio::test]
    async fn snapshot_is_a_defensive_copy() {
        let manager = manager_with(FakeProvider::approving(vec![ALICE]));
        manager.connect().await.unwrap();

        let mut snapshot = manager.current_session();
        snapshot.status = SessionStatus::Failed;
        snapshot.account = None;
        snapshot.contract = None;

        let live = manager.current_session();
        assert_eq!(live.status, SessionStatus::Connected);
        assert_eq!(live.account, Some(ALICE));
        assert!(live.contract.is_some());
    }

    #[tokio::test]
    async fn vanished_provider_fails_the_session_on_next_interaction() {
        let provider = FakeProvider::approving(vec![ALICE]);
        let handle = provider.handle();
        let manager = manager_with(provider);
        manager.connect().await.unwrap();

        handle.set_available(false);
        manager.check_provider();

        let session = manager.current_session();
        assert_eq!(session.status, SessionStatus::Failed);
        assert_invariant(&session);

        // Failed is a legal starting point once the provider returns.
        handle.set_available(true);
        let session = manager.connect().await.unwrap();
        assert_eq!(session.status, SessionStatus::Connected);
    }

    #[tokio::test]
    async fn generation_tracks_resets() {
        let manager = manager_with(FakeProvider::approving(vec![ALICE]));
        let session = manager.connect().await.unwrap();
        assert!(manager.generation_is_current(session.generation));

        manager.disconnect();
        assert!(!manager.generation_is_current(session.generation));
    }
}
