//! # Outbound Ports
//!
//! Traits for external collaborators: the ledger SDK that signs, submits and
//! executes, and the UI layer that receives status updates.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::config::NetworkConfig;
use crate::domain::{
    CadenceValue, ScriptPayload, TransactionId, TransactionPayload, TransactionStatus,
    UserIdentity,
};

/// Push feed of identity changes from the auth provider.
pub type IdentityFeed = BoxStream<'static, UserIdentity>;

/// Push feed of one transaction's status transitions.
pub type StatusFeed = BoxStream<'static, TransactionStatus>;

/// Errors reported by the ledger SDK.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Access node or auth provider unreachable.
    #[error("Ledger unreachable: {0}")]
    Unreachable(String),

    /// Network refused the transaction.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Script execution failed (panic, missing resource, bad arguments).
    #[error("Script failed: {0}")]
    ScriptFailed(String),
}

/// Ledger SDK - outbound port.
///
/// Everything that touches the network goes through here.
#[async_trait]
pub trait LedgerSdk: Send + Sync {
    /// Point the SDK at an access node and wallet discovery service.
    fn configure(&self, config: &NetworkConfig);

    /// Run the interactive authentication flow.
    ///
    /// May wait indefinitely on the user.
    async fn authenticate(&self) -> Result<UserIdentity, LedgerError>;

    /// Clear the provider's session.
    async fn deauthenticate(&self) -> Result<(), LedgerError>;

    /// Subscribe to identity changes. The current identity is delivered first.
    fn subscribe_identity(&self) -> IdentityFeed;

    /// Submit a transaction. Returns once the network accepts it.
    async fn submit_transaction(
        &self,
        payload: &TransactionPayload,
    ) -> Result<TransactionId, LedgerError>;

    /// Subscribe to a transaction's status transitions.
    async fn subscribe_transaction_status(
        &self,
        id: &TransactionId,
    ) -> Result<StatusFeed, LedgerError>;

    /// Execute a read-only script and return its raw JSON-Cadence result.
    async fn run_script(&self, payload: &ScriptPayload) -> Result<CadenceValue, LedgerError>;
}

/// UI status sink - outbound port.
///
/// At most one is bound to a session at a time.
pub trait StatusSink: Send + Sync {
    /// Receive one status transition.
    fn on_status(&self, id: &TransactionId, status: TransactionStatus);
}

impl<F> StatusSink for F
where
    F: Fn(&TransactionId, TransactionStatus) + Send + Sync,
{
    fn on_status(&self, id: &TransactionId, status: TransactionStatus) {
        self(id, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_is_status_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink = move |_: &TransactionId, status: TransactionStatus| {
            sink_seen.lock().unwrap().push(status);
        };

        sink.on_status(&TransactionId::new("ab"), TransactionStatus::Pending);
        assert_eq!(*seen.lock().unwrap(), vec![TransactionStatus::Pending]);
    }

    #[test]
    fn test_ledger_error_messages() {
        let err = LedgerError::Rejected("invalid signature".to_string());
        assert_eq!(err.to_string(), "Transaction rejected: invalid signature");
    }
}
