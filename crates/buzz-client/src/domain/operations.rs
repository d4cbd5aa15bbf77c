//! # Operation Catalogue
//!
//! The closed set of transactions and scripts the client can issue, each
//! with a static parameter schema and a fixed Cadence template.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::cadence::{Argument, ParamType};
use super::errors::BuzzError;
use super::invariants::{invariant_arguments_match, ParamSpec};
use super::templates;
use super::value_objects::Address;

/// Supported transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationId {
    /// Create the chip collection and its public capability if absent.
    InitAccount,
    /// Destroy the chip collection. Irreversible.
    ResetAccount,
    /// Mint a chip into the caller's collection.
    CreateChip,
    /// Overwrite a chip's public field map.
    EditPublicInfo,
    /// Overwrite a chip's private field (password checked on-chain).
    EditPrivateInfo,
    /// Overwrite a chip's display name.
    EditName,
}

const NO_PARAMS: &[ParamSpec] = &[];

const CREATE_CHIP_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("name", ParamType::String),
    ParamSpec::new("companyId", ParamType::UInt64),
    ParamSpec::new("password", ParamType::String),
];

const EDIT_PUBLIC_INFO_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("id", ParamType::UInt64),
    ParamSpec::new("newContent", ParamType::StringDictionary),
];

const EDIT_PRIVATE_INFO_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("id", ParamType::UInt64),
    ParamSpec::new("newContent", ParamType::String),
    ParamSpec::new("password", ParamType::String),
];

const EDIT_NAME_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("id", ParamType::UInt64),
    ParamSpec::new("newName", ParamType::String),
];

impl OperationId {
    /// Every supported operation.
    pub const ALL: [OperationId; 6] = [
        Self::InitAccount,
        Self::ResetAccount,
        Self::CreateChip,
        Self::EditPublicInfo,
        Self::EditPrivateInfo,
        Self::EditName,
    ];

    /// Catalogue name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitAccount => "initAccount",
            Self::ResetAccount => "resetAccount",
            Self::CreateChip => "createChip",
            Self::EditPublicInfo => "editPublicInfo",
            Self::EditPrivateInfo => "editPrivateInfo",
            Self::EditName => "editName",
        }
    }

    /// Declared parameters, in order.
    pub fn schema(&self) -> &'static [ParamSpec] {
        match self {
            Self::InitAccount | Self::ResetAccount => NO_PARAMS,
            Self::CreateChip => CREATE_CHIP_PARAMS,
            Self::EditPublicInfo => EDIT_PUBLIC_INFO_PARAMS,
            Self::EditPrivateInfo => EDIT_PRIVATE_INFO_PARAMS,
            Self::EditName => EDIT_NAME_PARAMS,
        }
    }

    /// Unrendered Cadence source.
    pub fn template(&self) -> &'static str {
        match self {
            Self::InitAccount => templates::INIT_ACCOUNT,
            Self::ResetAccount => templates::RESET_ACCOUNT,
            Self::CreateChip => templates::CREATE_CHIP,
            Self::EditPublicInfo => templates::EDIT_PUBLIC_INFO,
            Self::EditPrivateInfo => templates::EDIT_PRIVATE_INFO,
            Self::EditName => templates::EDIT_NAME,
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationId {
    type Err = BuzzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| BuzzError::UnknownOperation(s.to_string()))
    }
}

/// A validated transaction request.
///
/// Construction checks the arguments against the operation's schema, so a
/// request that exists is always well-typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    operation: OperationId,
    arguments: Vec<Argument>,
}

impl TransactionRequest {
    /// Validate `arguments` against `operation`'s schema.
    pub fn new(operation: OperationId, arguments: Vec<Argument>) -> Result<Self, BuzzError> {
        invariant_arguments_match(operation.name(), operation.schema(), &arguments)?;
        Ok(Self {
            operation,
            arguments,
        })
    }

    /// `initAccount`
    pub fn init_account() -> Self {
        Self::typed(OperationId::InitAccount, Vec::new())
    }

    /// `resetAccount`
    pub fn reset_account() -> Self {
        Self::typed(OperationId::ResetAccount, Vec::new())
    }

    /// `createChip(name, companyId, password)`
    pub fn create_chip(
        name: impl Into<String>,
        company_id: u64,
        password: impl Into<String>,
    ) -> Self {
        Self::typed(
            OperationId::CreateChip,
            vec![
                Argument::String(name.into()),
                Argument::UInt64(company_id),
                Argument::String(password.into()),
            ],
        )
    }

    /// `editPublicInfo(id, fields)`
    pub fn edit_public_info(id: u64, fields: BTreeMap<String, String>) -> Self {
        Self::typed(
            OperationId::EditPublicInfo,
            vec![Argument::UInt64(id), Argument::StringDictionary(fields)],
        )
    }

    /// `editPrivateInfo(id, content, password)`
    pub fn edit_private_info(
        id: u64,
        content: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::typed(
            OperationId::EditPrivateInfo,
            vec![
                Argument::UInt64(id),
                Argument::String(content.into()),
                Argument::String(password.into()),
            ],
        )
    }

    /// `editName(id, newName)`
    pub fn edit_name(id: u64, new_name: impl Into<String>) -> Self {
        Self::typed(
            OperationId::EditName,
            vec![Argument::UInt64(id), Argument::String(new_name.into())],
        )
    }

    // Typed builders match their schema by construction.
    fn typed(operation: OperationId, arguments: Vec<Argument>) -> Self {
        debug_assert!(
            invariant_arguments_match(operation.name(), operation.schema(), &arguments).is_ok()
        );
        Self {
            operation,
            arguments,
        }
    }

    /// Operation being requested.
    pub fn operation(&self) -> OperationId {
        self.operation
    }

    /// Arguments in declared order.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }
}

/// Supported read-only scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryId {
    /// Info on every chip in an account.
    FetchAll,
    /// Public info on one chip.
    FetchPublic,
    /// Private info on one chip, as its owner.
    FetchPrivate,
    /// Owner-facing info on one chip in an explicitly named account.
    FetchAsOwner,
}

impl QueryId {
    /// Catalogue name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchAll => "fetchAll",
            Self::FetchPublic => "fetchPublic",
            Self::FetchPrivate => "fetchPrivate",
            Self::FetchAsOwner => "fetchAsOwner",
        }
    }

    /// Unrendered Cadence source.
    pub fn template(&self) -> &'static str {
        match self {
            Self::FetchAll => templates::FETCH_ALL,
            Self::FetchPublic => templates::FETCH_PUBLIC,
            Self::FetchPrivate => templates::FETCH_PRIVATE,
            Self::FetchAsOwner => templates::FETCH_AS_OWNER,
        }
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A script request, always scoped to one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptRequest {
    query: QueryId,
    account: Address,
    chip_id: Option<u64>,
}

impl ScriptRequest {
    /// `fetchAll` for `account`.
    pub fn all(account: Address) -> Self {
        Self {
            query: QueryId::FetchAll,
            account,
            chip_id: None,
        }
    }

    /// A single-chip query for `account`.
    ///
    /// Passing `QueryId::FetchAll` here still yields a whole-collection query.
    pub fn chip(query: QueryId, chip_id: u64, account: Address) -> Self {
        let chip_id = if query == QueryId::FetchAll {
            None
        } else {
            Some(chip_id)
        };
        Self {
            query,
            account,
            chip_id,
        }
    }

    /// Script being requested.
    pub fn query(&self) -> QueryId {
        self.query
    }

    /// Account the script reads from.
    pub fn account(&self) -> Address {
        self.account
    }

    /// Chip id, for single-chip queries.
    pub fn chip_id(&self) -> Option<u64> {
        self.chip_id
    }

    /// Script arguments in declared order: `(id?, account)`.
    pub fn arguments(&self) -> Vec<Argument> {
        let mut args = Vec::with_capacity(2);
        if let Some(id) = self.chip_id {
            args.push(Argument::UInt64(id));
        }
        args.push(Argument::Address(self.account));
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_round_trip() {
        for op in OperationId::ALL {
            assert_eq!(op.name().parse::<OperationId>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_operation() {
        let err = "mintEverything".parse::<OperationId>().unwrap_err();
        assert_eq!(err, BuzzError::UnknownOperation("mintEverything".to_string()));
    }

    #[test]
    fn test_operation_serde_name() {
        let json = serde_json::to_string(&OperationId::EditPrivateInfo).unwrap();
        assert_eq!(json, "\"editPrivateInfo\"");
    }

    #[test]
    fn test_new_validates_schema() {
        let ok = TransactionRequest::new(
            OperationId::CreateChip,
            vec!["chip".into(), 7u64.into(), "pw".into()],
        );
        assert!(ok.is_ok());

        let bad = TransactionRequest::new(
            OperationId::CreateChip,
            vec!["chip".into(), "7".into(), "pw".into()],
        );
        assert!(matches!(bad, Err(BuzzError::InvalidArgument { .. })));
    }

    #[test]
    fn test_typed_builders_match_new() {
        let typed = TransactionRequest::edit_name(4, "Alice");
        let arguments = vec![4u64.into(), "Alice".into()];
        let checked = TransactionRequest::new(OperationId::EditName, arguments).unwrap();
        assert_eq!(typed, checked);
    }

    #[test]
    fn test_no_param_operations_reject_arguments() {
        let err = TransactionRequest::new(OperationId::InitAccount, vec![1u64.into()]).unwrap_err();
        assert!(err.to_string().contains("expected 0 arguments, got 1"));
    }

    #[test]
    fn test_script_arguments_order() {
        let account = Address::new(0x42);
        assert_eq!(
            ScriptRequest::chip(QueryId::FetchPublic, 9, account).arguments(),
            vec![Argument::UInt64(9), Argument::Address(account)]
        );
        assert_eq!(
            ScriptRequest::all(account).arguments(),
            vec![Argument::Address(account)]
        );
    }
}
