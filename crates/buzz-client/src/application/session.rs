//! # Session State
//!
//! The one piece of mutable client state: network config, current identity
//! and the bound status sink. Shared by handle, never global.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::NetworkConfig;
use crate::domain::{TransactionId, TransactionStatus, UserIdentity};
use crate::ports::StatusSink;

/// Session state shared by every component of one client.
pub struct Session {
    network: RwLock<NetworkConfig>,
    status_sink: RwLock<Option<Arc<dyn StatusSink>>>,
    identity_tx: watch::Sender<UserIdentity>,
}

impl Session {
    /// Create a session targeting `network`, nobody logged in.
    pub fn new(network: NetworkConfig) -> Self {
        let (identity_tx, _) = watch::channel(UserIdentity::unauthenticated());
        Self {
            network: RwLock::new(network),
            status_sink: RwLock::new(None),
            identity_tx,
        }
    }

    /// Replace the network config. Last call wins.
    pub fn configure(&self, network: NetworkConfig) {
        info!(
            "[buzz] Network configured: {} ({})",
            network.environment, network.access_node_api
        );
        *self.network.write() = network;
    }

    /// Snapshot of the current network config.
    pub fn network(&self) -> NetworkConfig {
        self.network.read().clone()
    }

    /// Bind the status sink, replacing any previous one.
    pub fn bind_status_callback(&self, sink: Arc<dyn StatusSink>) {
        let replaced = self.status_sink.write().replace(sink).is_some();
        debug!(replaced, "[buzz] Status sink bound");
    }

    /// Remove the status sink.
    pub fn unbind_status_callback(&self) {
        self.status_sink.write().take();
    }

    /// Whether a status sink is bound.
    pub fn has_status_callback(&self) -> bool {
        self.status_sink.read().is_some()
    }

    /// Push one status into whatever sink is bound right now.
    ///
    /// Returns `false` when no sink is bound and the status was dropped.
    pub fn emit_status(&self, id: &TransactionId, status: TransactionStatus) -> bool {
        // Clone out so the sink runs without the lock held.
        let sink = self.status_sink.read().clone();
        match sink {
            Some(sink) => {
                sink.on_status(id, status);
                true
            }
            None => {
                debug!(tx = %id, %status, "[buzz] No status sink bound, dropping update");
                false
            }
        }
    }

    /// Store the current identity.
    pub fn bind_identity(&self, identity: UserIdentity) {
        let address = identity.address;
        let logged_in = identity.logged_in;
        let changed = self.identity_tx.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        });
        if changed {
            match address {
                Some(address) if logged_in => info!("[buzz] User address: {}", address),
                _ => info!("[buzz] User unauthenticated"),
            }
        }
    }

    /// Last known identity, or the unauthenticated identity.
    pub fn current_identity(&self) -> UserIdentity {
        self.identity_tx.borrow().clone()
    }

    /// Receiver that observes every identity change.
    pub fn identity_changes(&self) -> watch::Receiver<UserIdentity> {
        self.identity_tx.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;
    use std::sync::Mutex;

    #[test]
    fn test_session_starts_unauthenticated() {
        let session = Session::default();
        assert_eq!(session.current_identity(), UserIdentity::unauthenticated());
        assert!(!session.has_status_callback());
    }

    #[test]
    fn test_configure_last_call_wins() {
        let session = Session::default();
        session.configure(NetworkConfig::for_testing());
        assert_eq!(session.network().access_node_api, "http://localhost:8888");
        session.configure(NetworkConfig::default());
        assert_eq!(session.network().access_node_api, "https://testnet.onflow.org");
    }

    #[test]
    fn test_bind_identity() {
        let session = Session::default();
        let user = UserIdentity::authenticated(Address::new(0x42));
        session.bind_identity(user.clone());
        assert_eq!(session.current_identity(), user);
    }

    #[test]
    fn test_identity_changes_observed() {
        let session = Session::default();
        let mut rx = session.identity_changes();
        session.bind_identity(UserIdentity::authenticated(Address::new(1)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().address, Some(Address::new(1)));

        // Same identity again is not a change.
        session.bind_identity(UserIdentity::authenticated(Address::new(1)));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_last_status_sink_wins() {
        let session = Session::default();
        let first = Arc::new(Mutex::new(0u32));
        let second = Arc::new(Mutex::new(0u32));

        let f = first.clone();
        session.bind_status_callback(Arc::new(move |_: &TransactionId, _: TransactionStatus| {
            *f.lock().unwrap() += 1;
        }));
        let s = second.clone();
        session.bind_status_callback(Arc::new(move |_: &TransactionId, _: TransactionStatus| {
            *s.lock().unwrap() += 1;
        }));

        assert!(session.emit_status(&TransactionId::new("t"), TransactionStatus::Pending));
        assert_eq!(*first.lock().unwrap(), 0);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn test_unbind_status_callback() {
        let session = Session::default();
        session.bind_status_callback(Arc::new(|_: &TransactionId, _: TransactionStatus| {}));
        assert!(session.has_status_callback());

        session.unbind_status_callback();
        assert!(!session.has_status_callback());
        assert!(!session.emit_status(&TransactionId::new("t"), TransactionStatus::Pending));
    }

    #[test]
    fn test_emit_without_sink_drops() {
        let session = Session::default();
        assert!(!session.emit_status(&TransactionId::new("t"), TransactionStatus::Sealed));
    }
}
