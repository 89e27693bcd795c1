//! Caller-facing surface
//!
//! Combines the session manager and mint controller behind the two
//! operations a UI needs: connect and mint. Every result is a typed success
//! snapshot or a tagged failure, distinguishable enough to drive affordances
//! like "install a wallet" versus "transaction reverted".

use std::sync::Arc;

use crate::config::MintConfig;
use crate::mint::{MintController, MintError, MintRequest, TransactionRecord};
use crate::provider::InjectedProvider;
use crate::session::{ConnectError, SessionManager, WalletSession};

pub struct MintService {
    session: Arc<SessionManager>,
    controller: MintController,
}

impl MintService {
    /// Build a service for the configured contract. `provider` is `None`
    /// when no wallet is installed; every connect then fails with
    /// `ProviderMissing` without touching the network.
    pub fn new(config: &MintConfig, provider: Option<Arc<dyn InjectedProvider>>) -> Self {
        let session = Arc::new(SessionManager::new(provider, config.contract_address));
        let controller = MintController::new(Arc::clone(&session));
        Self {
            session,
            controller,
        }
    }

    pub async fn connect(&self) -> Result<WalletSession, ConnectError> {
        self.session.connect().await
    }

    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    pub async fn mint(
        &self,
        recipient: impl Into<String>,
        token_uri: impl Into<String>,
    ) -> Result<TransactionRecord, MintError> {
        self.controller
            .submit(MintRequest::new(recipient, token_uri))
            .await
    }

    /// Defensive snapshot of the session for status displays.
    pub fn status(&self) -> WalletSession {
        self.session.current_session()
    }

    /// Snapshot of the most recent mint attempt, if any.
    pub fn latest_mint(&self) -> Option<TransactionRecord> {
        self.controller.latest_record()
    }
}
