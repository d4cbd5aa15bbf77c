//! # Status Notifier
//!
//! Turns a transaction handle into a cancellable stream of status updates,
//! and optionally forwards that stream into the session's status sink.
//!
//! ```text
//! ledger feed ──→ StatusTracker ──(ends after terminal / cancel)──→ caller
//!                      │
//!                      └── notify(): task ──→ Session::emit_status ──→ sink
//! ```

use futures::stream::{self, BoxStream, Stream, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{BuzzError, TransactionId, TransactionStatus};
use crate::ports::{LedgerError, LedgerSdk, StatusFeed};

use super::session::Session;

/// Cancels a [`StatusTracker`] from anywhere.
#[derive(Clone, Debug)]
pub struct TrackCanceller {
    tx: Arc<watch::Sender<bool>>,
}

impl TrackCanceller {
    /// Stop the tracker. It yields nothing further.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

struct TrackState {
    feed: StatusFeed,
    cancelled: watch::Receiver<bool>,
    done: bool,
}

/// Status transitions of one transaction, in the order the network sent them.
///
/// Ends right after the first terminal status, when cancelled, or when the
/// network closes the feed. Duplicates are passed through.
pub struct StatusTracker {
    id: TransactionId,
    canceller: TrackCanceller,
    inner: BoxStream<'static, TransactionStatus>,
}

impl std::fmt::Debug for StatusTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusTracker")
            .field("id", &self.id)
            .field("canceller", &self.canceller)
            .finish_non_exhaustive()
    }
}

impl StatusTracker {
    /// Wrap a raw ledger feed.
    pub fn new(id: TransactionId, feed: StatusFeed) -> Self {
        let (tx, cancelled) = watch::channel(false);
        let state = TrackState {
            feed,
            cancelled,
            done: false,
        };

        let inner = stream::unfold(state, |mut state| async move {
            let cancelled = *state.cancelled.borrow();
            if state.done || cancelled {
                return None;
            }
            tokio::select! {
                biased;
                _ = state.cancelled.changed() => None,
                next = state.feed.next() => {
                    let status = next?;
                    state.done = status.is_terminal();
                    Some((status, state))
                }
            }
        })
        .boxed();

        Self {
            id,
            canceller: TrackCanceller { tx: Arc::new(tx) },
            inner,
        }
    }

    /// Transaction being tracked.
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Handle that cancels this tracker.
    pub fn canceller(&self) -> TrackCanceller {
        self.canceller.clone()
    }

    /// Cancel this tracker.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }
}

impl Stream for StatusTracker {
    type Item = TransactionStatus;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// A running notification task.
pub struct NotificationHandle {
    id: TransactionId,
    canceller: TrackCanceller,
    task: JoinHandle<usize>,
}

impl NotificationHandle {
    /// Transaction being forwarded.
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Stop forwarding.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Handle that cancels this notification.
    pub fn canceller(&self) -> TrackCanceller {
        self.canceller.clone()
    }

    /// Wait for forwarding to end. Returns how many statuses reached a sink.
    pub async fn finished(self) -> usize {
        match self.task.await {
            Ok(delivered) => delivered,
            Err(e) => {
                warn!(tx = %self.id, "[buzz] Notification task failed: {}", e);
                0
            }
        }
    }
}

/// Subscribes to transaction lifecycles and relays them.
pub struct StatusNotifier<L: LedgerSdk> {
    ledger: Arc<L>,
    session: Arc<Session>,
    in_flight: Arc<Mutex<HashMap<TransactionId, TrackCanceller>>>,
}

impl<L: LedgerSdk + 'static> StatusNotifier<L> {
    /// Create a notifier over `ledger`, delivering into `session`'s sink.
    pub fn new(ledger: Arc<L>, session: Arc<Session>) -> Self {
        Self {
            ledger,
            session,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Open a status stream for `id`.
    pub async fn track(&self, id: &TransactionId) -> Result<StatusTracker, BuzzError> {
        let feed = self
            .ledger
            .subscribe_transaction_status(id)
            .await
            .map_err(|e| {
                warn!(tx = %id, "[buzz] Status subscription failed: {}", e);
                match e {
                    LedgerError::Unreachable(msg) => BuzzError::NetworkUnavailable(msg),
                    LedgerError::Rejected(msg) => BuzzError::SubmissionRejected(msg),
                    LedgerError::ScriptFailed(msg) => BuzzError::QueryFailed(msg),
                }
            })?;

        debug!(tx = %id, "[buzz] Tracking transaction");
        Ok(StatusTracker::new(id.clone(), feed))
    }

    /// Track `id` and push every status into the sink bound at delivery time.
    ///
    /// Must run inside a tokio runtime.
    pub async fn notify(&self, id: &TransactionId) -> Result<NotificationHandle, BuzzError> {
        let mut tracker = self.track(id).await?;
        let canceller = tracker.canceller();

        // A second notify for the same id supersedes the first.
        if let Some(previous) = self.in_flight.lock().insert(id.clone(), canceller.clone()) {
            previous.cancel();
        }

        let session = Arc::clone(&self.session);
        let in_flight = Arc::clone(&self.in_flight);
        let task_id = id.clone();
        let own = canceller.clone();
        let task = tokio::spawn(async move {
            let mut delivered = 0usize;
            while let Some(status) = tracker.next().await {
                debug!(tx = %task_id, %status, "[buzz] Transaction status");
                if session.emit_status(&task_id, status) {
                    delivered += 1;
                }
            }

            let mut registry = in_flight.lock();
            if registry
                .get(&task_id)
                .is_some_and(|current| Arc::ptr_eq(&current.tx, &own.tx))
            {
                registry.remove(&task_id);
            }
            delivered
        });

        Ok(NotificationHandle {
            id: id.clone(),
            canceller,
            task,
        })
    }

    /// Cancel the in-flight notification for `id`.
    ///
    /// Returns `false` if nothing was being forwarded for it.
    pub fn cancel(&self, id: &TransactionId) -> bool {
        match self.in_flight.lock().remove(id) {
            Some(canceller) => {
                canceller.cancel();
                debug!(tx = %id, "[buzz] Notification cancelled");
                true
            }
            None => false,
        }
    }

    /// Number of notifications still forwarding.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::config::NetworkConfig;
    use crate::domain::{Address, ContractAddresses, TransactionPayload, TransactionRequest};
    use futures::stream;
    use std::time::Duration;
    use tokio::time::timeout;
    use TransactionStatus::*;

    const OWNER: Address = Address::new(0xf8d6e0586b0a20c7);

    fn feed(statuses: Vec<TransactionStatus>) -> StatusFeed {
        stream::iter(statuses).boxed()
    }

    fn notifier() -> (StatusNotifier<InMemoryLedger>, Arc<InMemoryLedger>, Arc<Session>) {
        let ledger = Arc::new(InMemoryLedger::with_user(OWNER));
        let session = Arc::new(Session::new(NetworkConfig::for_testing()));
        let notifier = StatusNotifier::new(Arc::clone(&ledger), Arc::clone(&session));
        (notifier, ledger, session)
    }

    async fn accepted(ledger: &InMemoryLedger) -> TransactionId {
        let contracts = ContractAddresses {
            non_fungible_token: OWNER,
            buzz: OWNER,
        };
        let payload =
            TransactionPayload::build(&TransactionRequest::init_account(), &contracts, OWNER, 100);
        ledger.submit_transaction(&payload).await.unwrap()
    }

    #[tokio::test]
    async fn test_tracker_stops_after_sealed() {
        let tracker = StatusTracker::new(
            TransactionId::new("t1"),
            feed(vec![Pending, Finalized, Sealed, Sealed, Executed]),
        );
        let seen: Vec<_> = tracker.collect().await;
        assert_eq!(seen, vec![Pending, Finalized, Sealed]);
    }

    #[tokio::test]
    async fn test_tracker_passes_duplicates() {
        let tracker =
            StatusTracker::new(TransactionId::new("t1"), feed(vec![Pending, Pending, Errored]));
        let seen: Vec<_> = tracker.collect().await;
        assert_eq!(seen, vec![Pending, Pending, Errored]);
    }

    #[tokio::test]
    async fn test_tracker_ends_with_feed() {
        let tracker = StatusTracker::new(TransactionId::new("t1"), feed(vec![Pending]));
        let seen: Vec<_> = tracker.collect().await;
        assert_eq!(seen, vec![Pending]);
    }

    #[tokio::test]
    async fn test_cancel_before_poll() {
        let tracker = StatusTracker::new(TransactionId::new("t1"), feed(vec![Pending, Sealed]));
        tracker.cancel();
        let seen: Vec<_> = tracker.collect().await;
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_wakes_pending_tracker() {
        let open_ended = stream::iter(vec![Pending]).chain(stream::pending()).boxed();
        let mut tracker = StatusTracker::new(TransactionId::new("t1"), open_ended);
        let canceller = tracker.canceller();

        assert_eq!(tracker.next().await, Some(Pending));
        canceller.cancel();
        let next = timeout(Duration::from_millis(200), tracker.next())
            .await
            .expect("cancelled tracker should end promptly");
        assert_eq!(next, None);
        assert!(canceller.is_cancelled());
    }

    #[tokio::test]
    async fn test_finished_counts_delivered_statuses() {
        let (notifier, ledger, session) = notifier();
        session.bind_status_callback(Arc::new(|_: &TransactionId, _: TransactionStatus| {}));
        let id = accepted(&ledger).await;

        let handle = notifier.notify(&id).await.unwrap();
        assert_eq!(handle.id(), &id);
        assert_eq!(handle.finished().await, 4);
        assert_eq!(notifier.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_finished_without_sink_delivers_nothing() {
        let (notifier, ledger, _) = notifier();
        let id = accepted(&ledger).await;

        let handle = notifier.notify(&id).await.unwrap();
        assert_eq!(handle.finished().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_rejected_verbatim() {
        let (notifier, _, _) = notifier();
        let id = TransactionId::new("missing");

        let err = notifier.track(&id).await.unwrap_err();
        assert_eq!(
            err,
            BuzzError::SubmissionRejected("transaction not found: missing".to_string())
        );
    }
}
