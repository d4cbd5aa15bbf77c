//! # Domain Errors
//!
//! Error types surfaced to callers of the Buzz client.

use thiserror::Error;

use super::value_objects::{Address, TransactionId};

/// Buzz client error types.
///
/// Every network-originated failure is mapped onto one of these kinds and
/// handed back unchanged. Nothing here is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuzzError {
    /// An operation needed a logged-in user and none is bound.
    #[error("Not authenticated: log in before submitting or querying")]
    NotAuthenticated,

    /// The ledger or its auth provider could not be reached.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// An argument failed the operation's parameter schema.
    #[error("Invalid argument for {operation}: {reason}")]
    InvalidArgument {
        /// Operation being validated
        operation: String,
        /// What was wrong
        reason: String,
    },

    /// An operation id outside the fixed catalogue.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The network refused the transaction payload. Message is verbatim.
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// A read-only script failed or returned something undecodable.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The transaction was accepted but its status subscription failed.
    ///
    /// No statuses will reach the sink for `id`. `source` keeps the kind of
    /// the underlying failure.
    #[error("Transaction {id} accepted but not tracked: {source}")]
    TrackingFailed {
        /// Handle of the accepted transaction
        id: TransactionId,
        /// Why the status subscription failed
        source: Box<BuzzError>,
    },

    /// The client's network config cannot serve this call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The account has no public chip collection capability.
    #[error("Capability not found for account {address}")]
    CapabilityNotFound {
        /// Account that was queried
        address: Address,
    },
}

/// Result alias for client operations.
pub type BuzzResult<T> = Result<T, BuzzError>;
