//! # Domain Module
//!
//! Core domain types for the Buzz client: identities, statuses, the
//! operation catalogue and the payloads built from it.

pub mod cadence;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod operations;
pub mod templates;
pub mod value_objects;

pub use cadence::*;
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use operations::*;
pub use templates::{render, ContractAddresses, MISSING_CAPABILITY_MESSAGE};
pub use value_objects::*;
