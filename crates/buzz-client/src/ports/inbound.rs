//! # Inbound Ports
//!
//! API trait defining what the Buzz client can do.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::StatusTracker;
use crate::config::NetworkConfig;
use crate::domain::{Address, Argument, BuzzError, OperationId, TransactionId, UserIdentity};
use crate::ports::outbound::StatusSink;

/// Decoded info for one chip, keyed by field name.
pub type ChipInfo = BTreeMap<String, Value>;

/// Decoded info for every chip in an account, keyed by chip id.
pub type ChipCatalogue = BTreeMap<u64, Value>;

/// Buzz client API - inbound port.
#[async_trait]
pub trait BuzzApi: Send + Sync {
    /// Retarget the network. Last call wins.
    fn configure(&self, config: NetworkConfig);

    /// Replace the status sink.
    fn bind_status_callback(&self, sink: Arc<dyn StatusSink>);

    /// Last known identity, or the unauthenticated identity.
    fn current_identity(&self) -> UserIdentity;

    /// Run the wallet login flow.
    async fn log_in(&self) -> Result<UserIdentity, BuzzError>;

    /// Clear the wallet session.
    async fn log_out(&self) -> Result<(), BuzzError>;

    /// Validate and submit one catalogue operation.
    async fn submit(
        &self,
        operation: OperationId,
        arguments: Vec<Argument>,
    ) -> Result<TransactionId, BuzzError>;

    /// Stream a submitted transaction's status transitions.
    async fn track(&self, id: &TransactionId) -> Result<StatusTracker, BuzzError>;

    /// Every chip of the logged-in account.
    async fn fetch_all(&self) -> Result<ChipCatalogue, BuzzError>;

    /// Public info of a chip in the logged-in account.
    async fn fetch_public(&self, id: u64) -> Result<ChipInfo, BuzzError>;

    /// Private info of a chip in the logged-in account.
    async fn fetch_private(&self, id: u64) -> Result<ChipInfo, BuzzError>;

    /// Owner-facing info of a chip in `address`'s account.
    async fn fetch_as_owner(&self, id: u64, address: Address) -> Result<ChipInfo, BuzzError>;
}
