//! In-Memory Ledger Adapter
//!
//! Implements `LedgerSdk` by emulating the Buzz4 contract locally: one chip
//! collection per account, chip minting and edits, the public capability
//! check, and the owner password check. Status feeds replay a configurable
//! script so callers can exercise tracking without a network.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::config::NetworkConfig;
use crate::domain::{
    Address, Argument, CadenceValue, OperationId, ParamType, QueryId, ScriptPayload,
    TransactionId, TransactionPayload, TransactionStatus, UserIdentity,
    MISSING_CAPABILITY_MESSAGE,
};
use crate::ports::{IdentityFeed, LedgerError, LedgerSdk, StatusFeed};

const NIL_CHIP_MESSAGE: &str = "unexpectedly found nil while forcing an Optional value";
const NO_COLLECTION_MESSAGE: &str = "Could not borrow Buzz4 Collection";

#[derive(Clone, Debug)]
struct Chip {
    id: u64,
    name: String,
    company_id: u64,
    password: String,
    public_info: BTreeMap<String, String>,
    private_info: String,
}

impl Chip {
    fn public_value(&self) -> CadenceValue {
        CadenceValue::dictionary([
            string_entry("id", CadenceValue::UInt64(self.id.to_string())),
            string_entry("name", CadenceValue::String(self.name.clone())),
            string_entry("companyId", CadenceValue::UInt64(self.company_id.to_string())),
            string_entry("publicInfo", self.public_info_value()),
        ])
    }

    fn public_info_value(&self) -> CadenceValue {
        Argument::StringDictionary(self.public_info.clone()).to_cadence()
    }

    fn private_value(&self) -> CadenceValue {
        CadenceValue::dictionary([
            string_entry("id", CadenceValue::UInt64(self.id.to_string())),
            string_entry("privateInfo", CadenceValue::String(self.private_info.clone())),
        ])
    }

    fn owner_value(&self) -> CadenceValue {
        CadenceValue::dictionary([
            string_entry("id", CadenceValue::UInt64(self.id.to_string())),
            string_entry("name", CadenceValue::String(self.name.clone())),
            string_entry("companyId", CadenceValue::UInt64(self.company_id.to_string())),
            string_entry("publicInfo", self.public_info_value()),
            string_entry("privateInfo", CadenceValue::String(self.private_info.clone())),
        ])
    }
}

fn string_entry(key: &str, value: CadenceValue) -> (CadenceValue, CadenceValue) {
    (CadenceValue::String(key.to_string()), value)
}

type Collection = BTreeMap<u64, Chip>;

struct LedgerState {
    network: Option<NetworkConfig>,
    collections: HashMap<Address, Collection>,
    next_chip_id: u64,
    outcomes: HashMap<TransactionId, Result<(), String>>,
    last_payload: Option<TransactionPayload>,
    status_script: Vec<TransactionStatus>,
    open_ended: bool,
    reject: Option<String>,
}

/// Ledger SDK emulated in memory.
pub struct InMemoryLedger {
    user: Option<Address>,
    state: Mutex<LedgerState>,
    identity_tx: watch::Sender<UserIdentity>,
    unreachable: AtomicBool,
    status_unreachable: AtomicBool,
    tx_counter: AtomicU64,
    submissions: AtomicU64,
    identity_subscriptions: AtomicU64,
    status_subscriptions: AtomicU64,
    script_runs: AtomicU64,
}

impl InMemoryLedger {
    /// A ledger whose auth provider has no user to log in.
    pub fn new() -> Self {
        let (identity_tx, _) = watch::channel(UserIdentity::unauthenticated());
        Self {
            user: None,
            state: Mutex::new(LedgerState {
                network: None,
                collections: HashMap::new(),
                next_chip_id: 0,
                outcomes: HashMap::new(),
                last_payload: None,
                status_script: vec![
                    TransactionStatus::Pending,
                    TransactionStatus::Finalized,
                    TransactionStatus::Executed,
                    TransactionStatus::Sealed,
                ],
                open_ended: false,
                reject: None,
            }),
            identity_tx,
            unreachable: AtomicBool::new(false),
            status_unreachable: AtomicBool::new(false),
            tx_counter: AtomicU64::new(0),
            submissions: AtomicU64::new(0),
            identity_subscriptions: AtomicU64::new(0),
            status_subscriptions: AtomicU64::new(0),
            script_runs: AtomicU64::new(0),
        }
    }

    /// A ledger whose auth provider logs `user` in.
    pub fn with_user(user: Address) -> Self {
        Self {
            user: Some(user),
            ..Self::new()
        }
    }

    /// Replace the statuses every successful transaction reports.
    pub fn with_status_script(self, statuses: Vec<TransactionStatus>) -> Self {
        self.set_status_script(statuses);
        self
    }

    /// Replace the statuses every successful transaction reports.
    pub fn set_status_script(&self, statuses: Vec<TransactionStatus>) {
        self.state.lock().status_script = statuses;
    }

    /// Keep status feeds open after the script runs out.
    pub fn set_open_ended(&self, open_ended: bool) {
        self.state.lock().open_ended = open_ended;
    }

    /// Make every call fail as unreachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make only status subscriptions fail as unreachable.
    pub fn set_status_unreachable(&self, unreachable: bool) {
        self.status_unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Reject every submission with `message`.
    pub fn set_reject(&self, message: Option<String>) {
        self.state.lock().reject = message;
    }

    /// Give `account` an empty collection.
    pub fn seed_collection(&self, account: Address) {
        self.state.lock().collections.entry(account).or_default();
    }

    /// Whether `account` has a collection.
    pub fn has_collection(&self, account: Address) -> bool {
        self.state.lock().collections.contains_key(&account)
    }

    /// Chip ids in `account`'s collection.
    pub fn chip_ids(&self, account: Address) -> Vec<u64> {
        self.state
            .lock()
            .collections
            .get(&account)
            .map(|chips| chips.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Access node the ledger was last configured with.
    pub fn configured_node(&self) -> Option<String> {
        self.state
            .lock()
            .network
            .as_ref()
            .map(|n| n.access_node_api.clone())
    }

    /// Last accepted payload.
    pub fn last_payload(&self) -> Option<TransactionPayload> {
        self.state.lock().last_payload.clone()
    }

    /// Execution result of a submitted transaction.
    pub fn outcome(&self, id: &TransactionId) -> Option<Result<(), String>> {
        self.state.lock().outcomes.get(id).cloned()
    }

    /// Accepted submissions.
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Identity subscriptions opened.
    pub fn identity_subscriptions(&self) -> u64 {
        self.identity_subscriptions.load(Ordering::SeqCst)
    }

    /// Status subscriptions opened.
    pub fn status_subscriptions(&self) -> u64 {
        self.status_subscriptions.load(Ordering::SeqCst)
    }

    /// Scripts executed.
    pub fn script_runs(&self) -> u64 {
        self.script_runs.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), LedgerError> {
        if self.unreachable.load(Ordering::SeqCst) {
            let node = self
                .configured_node()
                .unwrap_or_else(|| "unconfigured".to_string());
            return Err(LedgerError::Unreachable(format!("connection refused: {}", node)));
        }
        Ok(())
    }

    fn next_transaction_id(&self) -> TransactionId {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        TransactionId::new(format!("{:064x}", n))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_arguments(
    arguments: &[CadenceValue],
    types: &[ParamType],
) -> Result<Vec<Argument>, String> {
    if arguments.len() != types.len() {
        return Err(format!(
            "incorrect number of arguments: expected {}, got {}",
            types.len(),
            arguments.len()
        ));
    }
    arguments
        .iter()
        .zip(types)
        .map(|(value, ty)| Argument::from_cadence(value, *ty))
        .collect()
}

fn chip_mut(collection: &mut Collection, id: u64) -> Result<&mut Chip, String> {
    collection.get_mut(&id).ok_or_else(|| NIL_CHIP_MESSAGE.to_string())
}

fn execute(
    state: &mut LedgerState,
    signer: Address,
    operation: OperationId,
    args: Vec<Argument>,
) -> Result<(), String> {
    if operation == OperationId::InitAccount {
        state.collections.entry(signer).or_default();
        return Ok(());
    }
    if operation == OperationId::ResetAccount {
        // Destroying an absent collection is a no-op.
        state.collections.remove(&signer);
        return Ok(());
    }

    let next_id = state.next_chip_id;
    let collection = state
        .collections
        .get_mut(&signer)
        .ok_or_else(|| NO_COLLECTION_MESSAGE.to_string())?;

    match (operation, args.as_slice()) {
        (
            OperationId::CreateChip,
            [Argument::String(name), Argument::UInt64(company_id), Argument::String(password)],
        ) => {
            collection.insert(
                next_id,
                Chip {
                    id: next_id,
                    name: name.clone(),
                    company_id: *company_id,
                    password: password.clone(),
                    public_info: BTreeMap::new(),
                    private_info: String::new(),
                },
            );
            state.next_chip_id += 1;
            Ok(())
        }
        (
            OperationId::EditPublicInfo,
            [Argument::UInt64(id), Argument::StringDictionary(fields)],
        ) => {
            chip_mut(collection, *id)?.public_info = fields.clone();
            Ok(())
        }
        (
            OperationId::EditPrivateInfo,
            [Argument::UInt64(id), Argument::String(content), Argument::String(password)],
        ) => {
            let chip = chip_mut(collection, *id)?;
            if chip.password != *password {
                return Err("pre-condition failed: wrong password".to_string());
            }
            chip.private_info = content.clone();
            Ok(())
        }
        (OperationId::EditName, [Argument::UInt64(id), Argument::String(new_name)]) => {
            chip_mut(collection, *id)?.name = new_name.clone();
            Ok(())
        }
        _ => Err(format!("invalid arguments for {}", operation)),
    }
}

#[async_trait]
impl LedgerSdk for InMemoryLedger {
    fn configure(&self, config: &NetworkConfig) {
        debug!("[buzz] In-memory ledger configured for {}", config.access_node_api);
        self.state.lock().network = Some(config.clone());
    }

    async fn authenticate(&self) -> Result<UserIdentity, LedgerError> {
        self.check_reachable()?;
        let user = self
            .user
            .ok_or_else(|| LedgerError::Rejected("no wallet user available".to_string()))?;
        let identity = UserIdentity::authenticated(user);
        self.identity_tx.send_replace(identity.clone());
        Ok(identity)
    }

    async fn deauthenticate(&self) -> Result<(), LedgerError> {
        self.check_reachable()?;
        self.identity_tx.send_replace(UserIdentity::unauthenticated());
        Ok(())
    }

    fn subscribe_identity(&self) -> IdentityFeed {
        self.identity_subscriptions.fetch_add(1, Ordering::SeqCst);
        WatchStream::new(self.identity_tx.subscribe()).boxed()
    }

    async fn submit_transaction(
        &self,
        payload: &TransactionPayload,
    ) -> Result<TransactionId, LedgerError> {
        self.check_reachable()?;

        let mut state = self.state.lock();
        if let Some(message) = state.reject.clone() {
            return Err(LedgerError::Rejected(message));
        }
        let signer = payload
            .authorizations
            .first()
            .copied()
            .ok_or_else(|| LedgerError::Rejected("missing authorizer".to_string()))?;

        let types: Vec<ParamType> = payload.operation.schema().iter().map(|p| p.ty).collect();
        let outcome = decode_arguments(&payload.arguments, &types)
            .and_then(|args| execute(&mut state, signer, payload.operation, args));

        let id = self.next_transaction_id();
        info!(
            tx = %id,
            operation = %payload.operation,
            ok = outcome.is_ok(),
            "[buzz] In-memory transaction executed"
        );
        state.outcomes.insert(id.clone(), outcome);
        state.last_payload = Some(payload.clone());
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn subscribe_transaction_status(
        &self,
        id: &TransactionId,
    ) -> Result<StatusFeed, LedgerError> {
        self.check_reachable()?;
        if self.status_unreachable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unreachable(format!(
                "status subscription refused: {}",
                id
            )));
        }

        let state = self.state.lock();
        let outcome = state
            .outcomes
            .get(id)
            .ok_or_else(|| LedgerError::Rejected(format!("transaction not found: {}", id)))?;

        let statuses: Vec<TransactionStatus> = match outcome {
            Ok(()) => state.status_script.clone(),
            Err(_) => state
                .status_script
                .iter()
                .copied()
                .filter(|s| !s.is_terminal() && *s != TransactionStatus::Executed)
                .chain(std::iter::once(TransactionStatus::Errored))
                .collect(),
        };
        self.status_subscriptions.fetch_add(1, Ordering::SeqCst);

        let feed = stream::iter(statuses);
        if state.open_ended {
            Ok(feed.chain(stream::pending()).boxed())
        } else {
            Ok(feed.boxed())
        }
    }

    async fn run_script(&self, payload: &ScriptPayload) -> Result<CadenceValue, LedgerError> {
        self.check_reachable()?;
        self.script_runs.fetch_add(1, Ordering::SeqCst);

        let types: &[ParamType] = match payload.query {
            QueryId::FetchAll => &[ParamType::Address],
            _ => &[ParamType::UInt64, ParamType::Address],
        };
        let args = decode_arguments(&payload.arguments, types).map_err(LedgerError::ScriptFailed)?;

        let (chip_id, account) = match args.as_slice() {
            [Argument::Address(account)] => (None, *account),
            [Argument::UInt64(id), Argument::Address(account)] => (Some(*id), *account),
            _ => return Err(LedgerError::ScriptFailed("invalid script arguments".to_string())),
        };

        let state = self.state.lock();
        let collection = state.collections.get(&account).ok_or_else(|| {
            LedgerError::ScriptFailed(format!("panic: {}", MISSING_CAPABILITY_MESSAGE))
        })?;

        let Some(chip_id) = chip_id else {
            return Ok(CadenceValue::dictionary(collection.values().map(|chip| {
                (CadenceValue::UInt64(chip.id.to_string()), chip.public_value())
            })));
        };

        let chip = collection
            .get(&chip_id)
            .ok_or_else(|| LedgerError::ScriptFailed(NIL_CHIP_MESSAGE.to_string()))?;

        Ok(match payload.query {
            QueryId::FetchPrivate => chip.private_value(),
            QueryId::FetchAsOwner => chip.owner_value(),
            _ => chip.public_value(),
        })
    }
}
