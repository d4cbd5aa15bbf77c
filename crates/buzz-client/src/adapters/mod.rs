//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the ledger port without a network, for tests and local runs.

mod in_memory;

pub use in_memory::InMemoryLedger;
