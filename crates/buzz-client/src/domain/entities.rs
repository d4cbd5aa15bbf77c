//! # Domain Entities
//!
//! Payloads handed to the ledger SDK. These are what cross the outbound port.

use serde::{Deserialize, Serialize};

use super::cadence::CadenceValue;
use super::operations::{OperationId, QueryId, ScriptRequest, TransactionRequest};
use super::templates::{render, ContractAddresses};
use super::value_objects::Address;

/// A rendered transaction ready for submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    /// Operation the payload was built from.
    pub operation: OperationId,
    /// Cadence source with real import addresses.
    pub cadence: String,
    /// JSON-Cadence arguments in declared order.
    pub arguments: Vec<CadenceValue>,
    /// Fee payer.
    pub payer: Address,
    /// Proposer (sequence number owner).
    pub proposer: Address,
    /// Accounts signing the `prepare` block.
    pub authorizations: Vec<Address>,
    /// Compute limit.
    pub compute_limit: u64,
}

impl TransactionPayload {
    /// Build the payload for `request`, with `signer` in every role.
    pub fn build(
        request: &TransactionRequest,
        contracts: &ContractAddresses,
        signer: Address,
        compute_limit: u64,
    ) -> Self {
        Self {
            operation: request.operation(),
            cadence: render(request.operation().template(), contracts),
            arguments: request.arguments().iter().map(|a| a.to_cadence()).collect(),
            payer: signer,
            proposer: signer,
            authorizations: vec![signer],
            compute_limit,
        }
    }
}

/// A rendered read-only script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPayload {
    /// Script the payload was built from.
    pub query: QueryId,
    /// Cadence source with real import addresses.
    pub cadence: String,
    /// JSON-Cadence arguments in declared order.
    pub arguments: Vec<CadenceValue>,
}

impl ScriptPayload {
    /// Build the payload for `request`.
    pub fn build(request: &ScriptRequest, contracts: &ContractAddresses) -> Self {
        Self {
            query: request.query(),
            cadence: render(request.query().template(), contracts),
            arguments: request.arguments().iter().map(|a| a.to_cadence()).collect(),
        }
    }
}
