//! # Buzz Client
//!
//! Wallet-session client for the Buzz4 chip contract.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Issue a fixed catalogue of pre-authored transactions and scripts against
//! the Buzz4 contract on behalf of a logged-in wallet user, and forward
//! transaction status updates to a UI layer:
//! - Login / logout with a single identity subscription
//! - Schema-checked submission of six transactions
//! - Cancellable status tracking, optionally pushed to one status sink
//! - Four read-only chip queries
//!
//! Signing, sealing and contract execution belong to the ledger SDK behind
//! the [`LedgerSdk`] port.
//!
//! ## Module Structure
//!
//! ```text
//! buzz-client/
//! ├── domain/          # Addresses, statuses, JSON-Cadence, operation catalogue, errors
//! ├── ports/           # BuzzApi (inbound) + LedgerSdk, StatusSink (outbound)
//! ├── application/     # Session, auth, dispatcher, notifier, queries, BuzzClient
//! ├── adapters/        # InMemoryLedger
//! ├── config.rs        # NetworkConfig
//! └── telemetry.rs     # tracing-subscriber setup
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

// Re-exports
pub use adapters::InMemoryLedger;
pub use application::{
    AuthBinder, BuzzClient, NotificationHandle, QueryFacade, Session, StatusNotifier,
    StatusTracker, TrackCanceller, TransactionDispatcher,
};
pub use config::{ConfigError, Environment, NetworkConfig};
pub use domain::{
    Address, Argument, BuzzError, BuzzResult, CadenceValue, NotifyPolicy, OperationId,
    ParamType, QueryId, TransactionId, TransactionRequest, TransactionStatus, UserIdentity,
    DEFAULT_COMPUTE_LIMIT,
};
pub use ports::{
    BuzzApi, ChipCatalogue, ChipInfo, IdentityFeed, LedgerError, LedgerSdk, StatusFeed,
    StatusSink,
};
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
