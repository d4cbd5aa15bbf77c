//! # Query Facade
//!
//! Fixed read-only scripts against a chip collection. Each call is exactly
//! one script execution; results come back decoded into plain JSON maps.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{
    is_missing_capability, Address, BuzzError, CadenceValue, QueryId, ScriptPayload,
    ScriptRequest,
};
use crate::ports::{ChipCatalogue, ChipInfo, LedgerError, LedgerSdk};

use super::session::Session;

/// Runs the catalogue scripts.
pub struct QueryFacade<L: LedgerSdk> {
    ledger: Arc<L>,
    session: Arc<Session>,
}

impl<L: LedgerSdk> QueryFacade<L> {
    /// Create a facade over `ledger`.
    pub fn new(ledger: Arc<L>, session: Arc<Session>) -> Self {
        Self { ledger, session }
    }

    /// Every chip of the logged-in account, keyed by id.
    pub async fn fetch_all(&self) -> Result<ChipCatalogue, BuzzError> {
        let account = self.current_account()?;
        let raw = self.run(ScriptRequest::all(account)).await?;
        decode_catalogue(&raw)
    }

    /// Public info of chip `id` in the logged-in account.
    pub async fn fetch_public(&self, id: u64) -> Result<ChipInfo, BuzzError> {
        let account = self.current_account()?;
        self.fetch_chip(QueryId::FetchPublic, id, account).await
    }

    /// Private info of chip `id` in the logged-in account.
    pub async fn fetch_private(&self, id: u64) -> Result<ChipInfo, BuzzError> {
        let account = self.current_account()?;
        self.fetch_chip(QueryId::FetchPrivate, id, account).await
    }

    /// Owner-facing info of chip `id` in `account`. No login needed.
    pub async fn fetch_as_owner(&self, id: u64, account: Address) -> Result<ChipInfo, BuzzError> {
        self.fetch_chip(QueryId::FetchAsOwner, id, account).await
    }

    async fn fetch_chip(
        &self,
        query: QueryId,
        id: u64,
        account: Address,
    ) -> Result<ChipInfo, BuzzError> {
        let raw = self.run(ScriptRequest::chip(query, id, account)).await?;
        decode_info(&raw)
    }

    fn current_account(&self) -> Result<Address, BuzzError> {
        self.session
            .current_identity()
            .authorized_address()
            .ok_or(BuzzError::NotAuthenticated)
    }

    async fn run(&self, request: ScriptRequest) -> Result<CadenceValue, BuzzError> {
        let contracts = self.session.network().contracts()?;
        let payload = ScriptPayload::build(&request, &contracts);
        let account = request.account();

        debug!(query = %request.query(), %account, "[buzz] Running script");

        self.ledger.run_script(&payload).await.map_err(|e| {
            warn!(query = %request.query(), %account, "[buzz] Script failed: {}", e);
            query_error(e, account)
        })
    }
}

fn query_error(error: LedgerError, account: Address) -> BuzzError {
    match error {
        LedgerError::ScriptFailed(msg) if is_missing_capability(&msg) => {
            BuzzError::CapabilityNotFound { address: account }
        }
        LedgerError::Unreachable(msg) => BuzzError::NetworkUnavailable(msg),
        LedgerError::ScriptFailed(msg) | LedgerError::Rejected(msg) => BuzzError::QueryFailed(msg),
    }
}

fn decode_info(raw: &CadenceValue) -> Result<ChipInfo, BuzzError> {
    match raw.to_json() {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(unexpected(raw)),
    }
}

fn decode_catalogue(raw: &CadenceValue) -> Result<ChipCatalogue, BuzzError> {
    let Value::Object(map) = raw.to_json() else {
        return Err(unexpected(raw));
    };
    map.into_iter()
        .map(|(key, info)| {
            key.parse::<u64>()
                .map(|id| (id, info))
                .map_err(|_| BuzzError::QueryFailed(format!("chip id is not a UInt64: {}", key)))
        })
        .collect()
}

fn unexpected(raw: &CadenceValue) -> BuzzError {
    BuzzError::QueryFailed(format!("unexpected result type {}", raw.type_name()))
}
