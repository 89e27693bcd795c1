//! Mint transaction lifecycle
//!
//! One controller tracks at most one in-flight mint at a time. Every attempt
//! gets a fresh `TransactionRecord`; records are never reused and a failed
//! attempt is never resubmitted silently, since repeating a state-changing
//! call without user intent risks a duplicate on-chain mint.

use alloy::primitives::TxHash;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::session::{SessionManager, SessionStatus};

/// User-supplied mint parameters, immutable once submitted.
///
/// Only non-emptiness is checked here. Address format and URI shape are
/// validated by the contract and provider layers, so the rules cannot
/// diverge from on-chain validation.
#[derive(Debug, Clone, Serialize)]
pub struct MintRequest {
    pub recipient: String,
    pub token_uri: String,
}

impl MintRequest {
    pub fn new(recipient: impl Into<String>, token_uri: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            token_uri: token_uri.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    Idle,
    Submitted,
    Confirmed,
    Failed,
    Abandoned,
}

/// Read-only record of one mint attempt.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub state: TxState,
    pub request: MintRequest,
    pub tx_hash: Option<TxHash>,
    pub error: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    fn new(request: MintRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: TxState::Idle,
            request,
            tx_hash: None,
            error: None,
            submitted_at: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum MintError {
    #[error("wallet session is not connected")]
    SessionNotReady,

    #[error("invalid mint request: {0}")]
    InvalidRequest(String),

    #[error("a mint transaction is already in flight")]
    TransactionInFlight,

    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    #[error("confirmation failed: {0}")]
    ConfirmationFailed(String),

    #[error("no mint transaction is in flight")]
    NothingInFlight,
}

struct ControllerState {
    in_flight: bool,
    latest: Option<TransactionRecord>,
}

/// Transaction controller for the mint operation.
pub struct MintController {
    session: Arc<SessionManager>,
    state: Mutex<ControllerState>,
}

impl MintController {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            state: Mutex::new(ControllerState {
                in_flight: false,
                latest: None,
            }),
        }
    }

    /// Submit one mint call and track it through confirmation.
    ///
    /// Exactly one on-chain call is issued per accepted submission; rejected
    /// submissions (not connected, invalid request, already in flight) issue
    /// none. Failed attempts require a fresh `submit`, never a retry here.
    pub async fn submit(&self, request: MintRequest) -> Result<TransactionRecord, MintError> {
        if request.recipient.trim().is_empty() {
            return Err(MintError::InvalidRequest(
                "recipient address is empty".to_string(),
            ));
        }
        if request.token_uri.trim().is_empty() {
            return Err(MintError::InvalidRequest("token URI is empty".to_string()));
        }

        // A provider that vanished since connect fails the session here,
        // before its status is consulted.
        self.session.check_provider();

        let session = self.session.current_session();
        if session.status != SessionStatus::Connected {
            return Err(MintError::SessionNotReady);
        }
        let contract = session.contract.ok_or(MintError::SessionNotReady)?;
        let generation = session.generation;

        let mut record = {
            let mut state = self.lock();
            if state.in_flight {
                return Err(MintError::TransactionInFlight);
            }
            state.in_flight = true;
            let record = TransactionRecord::new(request.clone());
            state.latest = Some(record.clone());
            record
        };
        // Released on settle, or by Drop if the caller stops awaiting us
        // (e.g. a timeout); the controller must never stay wedged.
        let mut attempt = InFlightGuard::new(self, record.id);

        info!(
            record = %record.id,
            recipient = %request.recipient,
            token_uri = %request.token_uri,
            "Submitting mint"
        );

        let tx_hash = match contract.mint(&request.recipient, &request.token_uri).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                warn!(record = %record.id, error = %e, "Mint submission rejected");
                record.state = TxState::Failed;
                record.error = Some(e.to_string());
                attempt.disarm();
                self.settle(record);
                return Err(MintError::SubmissionFailed(e.to_string()));
            }
        };

        record.state = TxState::Submitted;
        record.tx_hash = Some(tx_hash);
        record.submitted_at = Some(Utc::now());
        self.lock().latest = Some(record.clone());
        info!(record = %record.id, tx_hash = %tx_hash, "Mint accepted by the network");

        let outcome = contract.wait_mined(tx_hash).await;
        attempt.disarm();
        match outcome {
            Ok(()) if self.session.generation_is_current(generation) => {
                record.state = TxState::Confirmed;
                info!(record = %record.id, tx_hash = %tx_hash, "Mint confirmed");
                Ok(self.settle(record))
            }
            Ok(()) => {
                // The chain confirmed, but the session died underneath us
                // before the result could be attributed to it.
                let detail = "session closed before confirmation was observed";
                warn!(record = %record.id, tx_hash = %tx_hash, "Session closed before confirmation");
                record.state = TxState::Failed;
                record.error = Some(detail.to_string());
                self.settle(record);
                Err(MintError::ConfirmationFailed(detail.to_string()))
            }
            Err(e) => {
                warn!(record = %record.id, tx_hash = %tx_hash, error = %e, "Mint confirmation failed");
                record.state = TxState::Failed;
                record.error = Some(e.to_string());
                self.settle(record);
                Err(MintError::ConfirmationFailed(e.to_string()))
            }
        }
    }

    /// Stop awaiting the in-flight mint and mark it Abandoned locally.
    ///
    /// A broadcast transaction cannot be withdrawn; the on-chain mint may
    /// still land after the record is abandoned.
    pub fn abandon(&self) -> Result<TransactionRecord, MintError> {
        let mut state = self.lock();
        let record = match state.latest.as_mut() {
            Some(record) if record.state == TxState::Submitted => {
                record.state = TxState::Abandoned;
                record.error = Some(
                    "confirmation no longer awaited; the on-chain effect may still occur"
                        .to_string(),
                );
                record.clone()
            }
            _ => return Err(MintError::NothingInFlight),
        };
        state.in_flight = false;
        warn!(record = %record.id, "Mint abandoned before confirmation");
        Ok(record)
    }

    /// Snapshot of the most recent mint attempt, if any.
    pub fn latest_record(&self) -> Option<TransactionRecord> {
        self.lock().latest.clone()
    }

    /// Store the terminal record and release the in-flight guard.
    fn settle(&self, record: TransactionRecord) -> TransactionRecord {
        let mut guard = self.lock();
        let state = &mut *guard;
        match &state.latest {
            // An abandon that raced us wins; the caller already walked away.
            Some(latest) if latest.id == record.id && latest.state == TxState::Abandoned => {
                state.in_flight = false;
                latest.clone()
            }
            // A newer attempt owns the controller's bookkeeping now; keep
            // our terminal record caller-local.
            Some(latest) if latest.id != record.id => record,
            _ => {
                state.in_flight = false;
                state.latest = Some(record.clone());
                record
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases the in-flight slot if a submit future is dropped before it
/// settles, e.g. when the caller wraps the submit in a timeout. The
/// orphaned record is marked Abandoned, since nothing is awaiting the
/// network's answer anymore.
struct InFlightGuard<'a> {
    controller: &'a MintController,
    record_id: Uuid,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(controller: &'a MintController, record_id: Uuid) -> Self {
        Self {
            controller,
            record_id,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut guard = self.controller.lock();
        let state = &mut *guard;
        match state.latest.as_mut() {
            // A newer attempt owns the controller now; its own guard
            // handles the in-flight slot.
            Some(latest) if latest.id != self.record_id => {}
            Some(latest) => {
                state.in_flight = false;
                if matches!(latest.state, TxState::Idle | TxState::Submitted) {
                    latest.state = TxState::Abandoned;
                    latest.error = Some(
                        "mint attempt dropped before settlement; the on-chain effect may still occur"
                            .to_string(),
                    );
                    warn!(record = %latest.id, "Mint attempt dropped before settlement");
                }
            }
            None => state.in_flight = false,
        }
    }
}
