//! # Transaction Dispatcher
//!
//! Validates a request against its schema, renders the fixed template and
//! submits it under the current identity. One network round-trip per call.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{
    Argument, BuzzError, OperationId, TransactionId, TransactionPayload, TransactionRequest,
};
use crate::ports::{LedgerError, LedgerSdk};

use super::session::Session;

/// Submits catalogue transactions.
pub struct TransactionDispatcher<L: LedgerSdk> {
    ledger: Arc<L>,
    session: Arc<Session>,
}

impl<L: LedgerSdk> TransactionDispatcher<L> {
    /// Create a dispatcher over `ledger`.
    pub fn new(ledger: Arc<L>, session: Arc<Session>) -> Self {
        Self { ledger, session }
    }

    /// Validate untyped arguments, then submit.
    ///
    /// Nothing reaches the network if validation fails.
    pub async fn submit_op(
        &self,
        operation: OperationId,
        arguments: Vec<Argument>,
    ) -> Result<TransactionId, BuzzError> {
        let request = TransactionRequest::new(operation, arguments).map_err(|e| {
            debug!(%operation, "[buzz] Rejected request: {}", e);
            e
        })?;
        self.submit(&request).await
    }

    /// Submit a validated request. Returns on network acceptance, not finality.
    pub async fn submit(&self, request: &TransactionRequest) -> Result<TransactionId, BuzzError> {
        let operation = request.operation();
        let signer = self
            .session
            .current_identity()
            .authorized_address()
            .ok_or(BuzzError::NotAuthenticated)?;

        let network = self.session.network();
        let contracts = network.contracts()?;
        let payload = TransactionPayload::build(request, &contracts, signer, network.compute_limit);

        debug!(
            %operation,
            %signer,
            args = payload.arguments.len(),
            "[buzz] Submitting transaction"
        );

        let id = self
            .ledger
            .submit_transaction(&payload)
            .await
            .map_err(|e| {
                warn!(%operation, "[buzz] Submission failed: {}", e);
                submit_error(e)
            })?;

        info!(%operation, tx = %id, "[buzz] Transaction accepted");
        Ok(id)
    }
}

fn submit_error(error: LedgerError) -> BuzzError {
    match error {
        LedgerError::Unreachable(msg) => BuzzError::NetworkUnavailable(msg),
        LedgerError::Rejected(msg) | LedgerError::ScriptFailed(msg) => {
            BuzzError::SubmissionRejected(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::config::NetworkConfig;
    use crate::domain::{Address, UserIdentity};

    const USER: Address = Address::new(0x01cf0e2f2f715450);

    fn dispatcher(
        ledger: Arc<InMemoryLedger>,
    ) -> (TransactionDispatcher<InMemoryLedger>, Arc<Session>) {
        let session = Arc::new(Session::new(NetworkConfig::for_testing()));
        (TransactionDispatcher::new(ledger, session.clone()), session)
    }

    #[tokio::test]
    async fn test_submit_requires_identity() {
        let ledger = Arc::new(InMemoryLedger::with_user(USER));
        let (dispatcher, _) = dispatcher(ledger.clone());

        let err = dispatcher
            .submit(&TransactionRequest::init_account())
            .await
            .unwrap_err();
        assert_eq!(err, BuzzError::NotAuthenticated);
        assert_eq!(ledger.submissions(), 0);
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_submit() {
        let ledger = Arc::new(InMemoryLedger::with_user(USER));
        let (dispatcher, session) = dispatcher(ledger.clone());
        session.bind_identity(UserIdentity::authenticated(USER));

        let err = dispatcher
            .submit_op(OperationId::EditName, vec!["Alice".into(), 1u64.into()])
            .await
            .unwrap_err();
        assert!(matches!(err, BuzzError::InvalidArgument { .. }));
        assert_eq!(ledger.submissions(), 0);
    }

    #[tokio::test]
    async fn test_submit_uses_signer_in_every_role() {
        let ledger = Arc::new(InMemoryLedger::with_user(USER));
        let (dispatcher, session) = dispatcher(ledger.clone());
        session.bind_identity(UserIdentity::authenticated(USER));

        dispatcher
            .submit(&TransactionRequest::init_account())
            .await
            .unwrap();

        let payload = ledger.last_payload().unwrap();
        assert_eq!(payload.payer, USER);
        assert_eq!(payload.proposer, USER);
        assert_eq!(payload.authorizations, vec![USER]);
        assert_eq!(payload.compute_limit, 100);
        assert_eq!(ledger.submissions(), 1);
    }

    #[tokio::test]
    async fn test_rejection_is_verbatim() {
        let ledger = Arc::new(InMemoryLedger::with_user(USER));
        ledger.set_reject(Some("[Error Code: 1006] invalid proposal key".to_string()));
        let (dispatcher, session) = dispatcher(ledger);
        session.bind_identity(UserIdentity::authenticated(USER));

        let err = dispatcher
            .submit(&TransactionRequest::reset_account())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BuzzError::SubmissionRejected("[Error Code: 1006] invalid proposal key".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_network() {
        let ledger = Arc::new(InMemoryLedger::with_user(USER));
        ledger.set_unreachable(true);
        let (dispatcher, session) = dispatcher(ledger);
        session.bind_identity(UserIdentity::authenticated(USER));

        let err = dispatcher
            .submit(&TransactionRequest::init_account())
            .await
            .unwrap_err();
        assert!(matches!(err, BuzzError::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_contract_address() {
        let ledger = Arc::new(InMemoryLedger::with_user(USER));
        let (dispatcher, session) = dispatcher(ledger.clone());
        session.configure(NetworkConfig {
            buzz_contract: None,
            ..NetworkConfig::for_testing()
        });
        session.bind_identity(UserIdentity::authenticated(USER));

        let err = dispatcher
            .submit(&TransactionRequest::init_account())
            .await
            .unwrap_err();
        assert!(matches!(err, BuzzError::Configuration(_)));
        assert_eq!(ledger.submissions(), 0);
    }
}
