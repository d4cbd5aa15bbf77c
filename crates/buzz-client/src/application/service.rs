//! # Buzz Client Service
//!
//! Application service composing session, auth, dispatch, status and
//! queries behind the [`BuzzApi`] port.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::NetworkConfig;
use crate::domain::{
    Address, Argument, BuzzError, NotifyPolicy, OperationId, TransactionId, TransactionRequest,
    UserIdentity,
};
use crate::ports::{BuzzApi, ChipCatalogue, ChipInfo, LedgerSdk, StatusSink};

use super::auth::AuthBinder;
use super::dispatcher::TransactionDispatcher;
use super::notifier::{StatusNotifier, StatusTracker};
use super::queries::QueryFacade;
use super::session::Session;

/// Buzz Client - one wallet session against one ledger.
pub struct BuzzClient<L: LedgerSdk> {
    /// Shared session state.
    session: Arc<Session>,
    /// Login / logout / identity subscription.
    auth: AuthBinder<L>,
    /// Transaction submission.
    dispatcher: TransactionDispatcher<L>,
    /// Status tracking and sink forwarding.
    notifier: StatusNotifier<L>,
    /// Read-only scripts.
    queries: QueryFacade<L>,
}

impl<L: LedgerSdk + 'static> BuzzClient<L> {
    /// Create a client and push `config` into the ledger.
    pub fn new(ledger: Arc<L>, config: NetworkConfig) -> Self {
        let session = Arc::new(Session::new(config));
        let client = Self {
            auth: AuthBinder::new(Arc::clone(&ledger), Arc::clone(&session)),
            dispatcher: TransactionDispatcher::new(Arc::clone(&ledger), Arc::clone(&session)),
            notifier: StatusNotifier::new(Arc::clone(&ledger), Arc::clone(&session)),
            queries: QueryFacade::new(ledger, Arc::clone(&session)),
            session,
        };
        client.auth.apply_network();
        client
    }

    /// Shared session state.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Open the identity subscription without logging in.
    ///
    /// Returns `true` if this call opened it.
    pub fn sync_identity(&self) -> bool {
        self.auth.sync_identity()
    }

    /// Receiver that observes every identity change.
    pub fn identity_changes(&self) -> watch::Receiver<UserIdentity> {
        self.session.identity_changes()
    }

    /// Submit with an explicit notification policy.
    pub async fn submit_with(
        &self,
        operation: OperationId,
        arguments: Vec<Argument>,
        policy: NotifyPolicy,
    ) -> Result<TransactionId, BuzzError> {
        let request = TransactionRequest::new(operation, arguments)?;
        self.submit_request(&request, policy).await
    }

    /// Submit a pre-built request with the configured notification policy.
    pub async fn submit_request_default(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionId, BuzzError> {
        let policy = self.session.network().default_notify_policy();
        self.submit_request(request, policy).await
    }

    /// Submit a pre-built request.
    ///
    /// With [`NotifyPolicy::Track`] every status of the accepted transaction
    /// is forwarded to the status sink bound at delivery time. If the status
    /// subscription cannot be opened the transaction is still on the ledger,
    /// so the error is [`BuzzError::TrackingFailed`] carrying its id.
    pub async fn submit_request(
        &self,
        request: &TransactionRequest,
        policy: NotifyPolicy,
    ) -> Result<TransactionId, BuzzError> {
        let id = self.dispatcher.submit(request).await?;

        if policy == NotifyPolicy::Track {
            if let Err(e) = self.notifier.notify(&id).await {
                warn!(tx = %id, "[buzz] Could not track transaction: {}", e);
                return Err(BuzzError::TrackingFailed {
                    id,
                    source: Box::new(e),
                });
            }
        }

        Ok(id)
    }

    /// Stop forwarding statuses for `id`. Returns `false` if none were.
    pub fn cancel_notification(&self, id: &TransactionId) -> bool {
        self.notifier.cancel(id)
    }

    /// Number of transactions whose statuses are still being forwarded.
    pub fn active_notifications(&self) -> usize {
        self.notifier.in_flight()
    }

    /// Create the chip collection if absent.
    pub async fn init_account(&self) -> Result<TransactionId, BuzzError> {
        self.submit_request_default(&TransactionRequest::init_account())
            .await
    }

    /// Destroy the chip collection and every chip in it.
    pub async fn reset_account(&self) -> Result<TransactionId, BuzzError> {
        self.submit_request_default(&TransactionRequest::reset_account())
            .await
    }

    /// Mint a chip into the caller's collection.
    pub async fn create_chip(
        &self,
        name: &str,
        company_id: u64,
        password: &str,
    ) -> Result<TransactionId, BuzzError> {
        self.submit_request_default(&TransactionRequest::create_chip(name, company_id, password))
            .await
    }

    /// Replace a chip's public field map.
    pub async fn edit_public_info(
        &self,
        id: u64,
        fields: BTreeMap<String, String>,
    ) -> Result<TransactionId, BuzzError> {
        self.submit_request_default(&TransactionRequest::edit_public_info(id, fields))
            .await
    }

    /// Replace a chip's private field. The contract checks `password`.
    pub async fn edit_private_info(
        &self,
        id: u64,
        content: &str,
        password: &str,
    ) -> Result<TransactionId, BuzzError> {
        self.submit_request_default(&TransactionRequest::edit_private_info(id, content, password))
            .await
    }

    /// Rename a chip.
    pub async fn edit_name(&self, id: u64, new_name: &str) -> Result<TransactionId, BuzzError> {
        self.submit_request_default(&TransactionRequest::edit_name(id, new_name))
            .await
    }
}

#[async_trait]
impl<L: LedgerSdk + 'static> BuzzApi for BuzzClient<L> {
    fn configure(&self, config: NetworkConfig) {
        self.session.configure(config);
        self.auth.apply_network();
    }

    fn bind_status_callback(&self, sink: Arc<dyn StatusSink>) {
        self.session.bind_status_callback(sink);
    }

    fn current_identity(&self) -> UserIdentity {
        self.session.current_identity()
    }

    async fn log_in(&self) -> Result<UserIdentity, BuzzError> {
        let identity = self.auth.log_in().await?;
        info!("[buzz] Logged in");
        Ok(identity)
    }

    async fn log_out(&self) -> Result<(), BuzzError> {
        self.auth.log_out().await?;
        info!("[buzz] Logged out");
        Ok(())
    }

    async fn submit(
        &self,
        operation: OperationId,
        arguments: Vec<Argument>,
    ) -> Result<TransactionId, BuzzError> {
        let policy = self.session.network().default_notify_policy();
        self.submit_with(operation, arguments, policy).await
    }

    async fn track(&self, id: &TransactionId) -> Result<StatusTracker, BuzzError> {
        self.notifier.track(id).await
    }

    async fn fetch_all(&self) -> Result<ChipCatalogue, BuzzError> {
        self.queries.fetch_all().await
    }

    async fn fetch_public(&self, id: u64) -> Result<ChipInfo, BuzzError> {
        self.queries.fetch_public(id).await
    }

    async fn fetch_private(&self, id: u64) -> Result<ChipInfo, BuzzError> {
        self.queries.fetch_private(id).await
    }

    async fn fetch_as_owner(&self, id: u64, address: Address) -> Result<ChipInfo, BuzzError> {
        self.queries.fetch_as_owner(id, address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::domain::TransactionStatus;
    use futures::StreamExt;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::timeout;

    const USER: Address = Address::new(0x179b6b1cb6755e31);

    fn create_test_client() -> (BuzzClient<InMemoryLedger>, Arc<InMemoryLedger>) {
        let ledger = Arc::new(InMemoryLedger::with_user(USER));
        let client = BuzzClient::new(Arc::clone(&ledger), NetworkConfig::for_testing());
        (client, ledger)
    }

    fn recording_sink() -> (Arc<dyn StatusSink>, Arc<Mutex<Vec<TransactionStatus>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink = move |_: &TransactionId, status: TransactionStatus| {
            sink_seen.lock().unwrap().push(status);
        };
        (Arc::new(sink), seen)
    }

    #[tokio::test]
    async fn test_new_configures_ledger() {
        let (_client, ledger) = create_test_client();
        assert_eq!(
            ledger.configured_node().as_deref(),
            Some("http://localhost:8888")
        );
    }

    #[tokio::test]
    async fn test_configure_reaches_ledger() {
        let (client, ledger) = create_test_client();
        client.configure(NetworkConfig::default());
        assert_eq!(
            ledger.configured_node().as_deref(),
            Some("https://testnet.onflow.org")
        );
    }

    #[tokio::test]
    async fn test_submit_before_login() {
        let (client, ledger) = create_test_client();
        let err = client.init_account().await.unwrap_err();
        assert_eq!(err, BuzzError::NotAuthenticated);
        assert_eq!(ledger.submissions(), 0);
    }

    #[tokio::test]
    async fn test_submit_forwards_statuses() {
        let (client, _) = create_test_client();
        let (sink, seen) = recording_sink();
        client.bind_status_callback(sink);
        client.log_in().await.unwrap();

        let id = client.init_account().await.unwrap();
        let mut tracker = client.track(&id).await.unwrap();
        while tracker.next().await.is_some() {}

        timeout(Duration::from_secs(1), async {
            while client.active_notifications() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                TransactionStatus::Pending,
                TransactionStatus::Finalized,
                TransactionStatus::Executed,
                TransactionStatus::Sealed
            ]
        );
    }

    #[tokio::test]
    async fn test_skip_policy_never_notifies() {
        let (client, ledger) = create_test_client();
        let (sink, seen) = recording_sink();
        client.bind_status_callback(sink);
        client.log_in().await.unwrap();

        client
            .submit_with(OperationId::InitAccount, Vec::new(), NotifyPolicy::Skip)
            .await
            .unwrap();

        assert_eq!(client.active_notifications(), 0);
        assert_eq!(ledger.status_subscriptions(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tracking_failure_keeps_transaction_id() {
        let (client, ledger) = create_test_client();
        client.log_in().await.unwrap();
        ledger.set_status_unreachable(true);

        let err = client.init_account().await.unwrap_err();
        let id = match err {
            BuzzError::TrackingFailed { id, source } => {
                assert!(matches!(*source, BuzzError::NetworkUnavailable(_)));
                id
            }
            other => panic!("expected TrackingFailed, got {:?}", other),
        };
        assert_eq!(ledger.submissions(), 1);
        assert_eq!(client.active_notifications(), 0);

        // The accepted transaction is still trackable once the feed is back.
        ledger.set_status_unreachable(false);
        let statuses: Vec<_> = client.track(&id).await.unwrap().collect().await;
        assert_eq!(statuses.last(), Some(&TransactionStatus::Sealed));
    }

    #[tokio::test]
    async fn test_cancel_unknown_notification() {
        let (client, _) = create_test_client();
        assert!(!client.cancel_notification(&TransactionId::new("nope")));
    }

    #[tokio::test]
    async fn test_log_out_clears_identity() {
        let (client, _) = create_test_client();
        client.log_in().await.unwrap();
        assert!(client.current_identity().logged_in);

        client.log_out().await.unwrap();
        assert_eq!(client.current_identity(), UserIdentity::unauthenticated());
    }
}
