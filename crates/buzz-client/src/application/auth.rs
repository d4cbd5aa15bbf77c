//! # Auth Binder
//!
//! Drives the ledger's authentication flow and keeps the session's identity
//! in step with the provider through a single identity subscription.
//!
//! The subscription task is the only writer of the session identity. Login
//! and logout wait until it has delivered the state they produced.

use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::{BuzzError, UserIdentity};
use crate::ports::{LedgerError, LedgerSdk};

use super::session::Session;

/// How long login / logout wait for the identity feed to catch up.
pub const IDENTITY_CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

/// Binds the session to the ledger's auth provider.
pub struct AuthBinder<L: LedgerSdk> {
    ledger: Arc<L>,
    session: Arc<Session>,
    subscribed: AtomicBool,
}

impl<L: LedgerSdk + 'static> AuthBinder<L> {
    /// Create a binder. No subscription is opened yet.
    pub fn new(ledger: Arc<L>, session: Arc<Session>) -> Self {
        Self {
            ledger,
            session,
            subscribed: AtomicBool::new(false),
        }
    }

    /// Push the session's network config into the ledger.
    pub fn apply_network(&self) {
        self.ledger.configure(&self.session.network());
    }

    /// Open the identity subscription if it is not open yet.
    ///
    /// Returns `true` if this call opened it. Must run inside a tokio runtime.
    pub fn sync_identity(&self) -> bool {
        if self
            .subscribed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("[buzz] Identity subscription already open");
            return false;
        }

        let mut feed = self.ledger.subscribe_identity();
        let session = Arc::clone(&self.session);
        tokio::spawn(async move {
            while let Some(identity) = feed.next().await {
                session.bind_identity(identity);
            }
            debug!("[buzz] Identity feed closed");
        });

        info!("[buzz] Identity subscription established");
        true
    }

    /// Whether the identity subscription has been opened.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }

    /// Authenticate and wait until the session holds the new identity.
    pub async fn log_in(&self) -> Result<UserIdentity, BuzzError> {
        self.sync_identity();

        let identity = self.ledger.authenticate().await.map_err(|e| {
            warn!("[buzz] Login failed: {}", e);
            auth_error(e)
        })?;

        let address = identity.address;
        let reached = move |current: &UserIdentity| current.logged_in && current.address == address;
        self.confirm("login", reached).await?;
        Ok(identity)
    }

    /// Clear the provider session and wait until the session is unauthenticated.
    pub async fn log_out(&self) -> Result<(), BuzzError> {
        self.sync_identity();

        self.ledger.deauthenticate().await.map_err(|e| {
            warn!("[buzz] Logout failed: {}", e);
            auth_error(e)
        })?;

        self.confirm("logout", |current| !current.logged_in).await
    }

    async fn confirm(
        &self,
        action: &str,
        reached: impl FnMut(&UserIdentity) -> bool,
    ) -> Result<(), BuzzError> {
        let mut changes = self.session.identity_changes();
        let confirmed = matches!(
            timeout(IDENTITY_CONFIRM_TIMEOUT, changes.wait_for(reached)).await,
            Ok(Ok(_))
        );
        if confirmed {
            return Ok(());
        }

        warn!("[buzz] Identity feed did not confirm {}", action);
        Err(BuzzError::NetworkUnavailable(format!(
            "identity subscription did not confirm {}",
            action
        )))
    }
}

fn auth_error(error: LedgerError) -> BuzzError {
    match error {
        LedgerError::Unreachable(msg) => BuzzError::NetworkUnavailable(msg),
        LedgerError::Rejected(msg) | LedgerError::ScriptFailed(msg) => {
            BuzzError::NetworkUnavailable(format!("auth provider error: {}", msg))
        }
    }
}
