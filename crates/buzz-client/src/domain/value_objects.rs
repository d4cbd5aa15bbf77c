//! # Domain Value Objects
//!
//! Immutable value types shared by the session, dispatcher and notifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Address parse failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid account address: {0}")]
pub struct AddressParseError(pub String);

/// Ledger account address (8 bytes).
///
/// Displays as `0x` followed by 16 lowercase hex digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(u64);

impl Address {
    /// Create an address from its numeric value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric value of the address.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);

        if digits.is_empty() || digits.len() > 16 {
            return Err(AddressParseError(s.to_string()));
        }

        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| AddressParseError(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// Opaque transaction handle returned on submission.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap a network-issued id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction lifecycle status as reported by the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Not yet known to the network.
    Unknown,
    /// Accepted, waiting for a block.
    Pending,
    /// Included in a finalized block.
    Finalized,
    /// Executed by execution nodes.
    Executed,
    /// Sealed. Terminal.
    Sealed,
    /// Reference block expired before inclusion. Terminal.
    Expired,
    /// Execution failed. Terminal.
    Errored,
}

impl TransactionStatus {
    /// Map a numeric status code from the access API.
    ///
    /// Codes above 5 are not defined by the network and map to `Unknown`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Pending,
            2 => Self::Finalized,
            3 => Self::Executed,
            4 => Self::Sealed,
            5 => Self::Expired,
            _ => Self::Unknown,
        }
    }

    /// Position in the lifecycle. Terminal failures rank with `Sealed`.
    pub fn lifecycle_rank(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Pending => 1,
            Self::Finalized => 2,
            Self::Executed => 3,
            Self::Sealed | Self::Expired | Self::Errored => 4,
        }
    }

    /// Whether no further updates will follow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sealed | Self::Expired | Self::Errored)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "UNKNOWN",
            Self::Pending => "PENDING",
            Self::Finalized => "FINALIZED",
            Self::Executed => "EXECUTED",
            Self::Sealed => "SEALED",
            Self::Expired => "EXPIRED",
            Self::Errored => "ERRORED",
        };
        f.write_str(label)
    }
}

/// Identity of the wallet user, as reported by the auth provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Account address. `None` while unauthenticated.
    #[serde(rename = "addr")]
    pub address: Option<Address>,
    /// Whether the provider considers the user logged in.
    pub logged_in: bool,
    /// Provider-issued account proof id.
    pub cid: Option<String>,
    /// Session expiry (unix seconds).
    pub expires_at: Option<u64>,
}

impl UserIdentity {
    /// The "nobody logged in" identity.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// A logged-in identity for `address`.
    pub fn authenticated(address: Address) -> Self {
        Self {
            address: Some(address),
            logged_in: true,
            cid: None,
            expires_at: None,
        }
    }

    /// Address usable as payer/proposer/authorizer, if logged in.
    pub fn authorized_address(&self) -> Option<Address> {
        if self.logged_in {
            self.address
        } else {
            None
        }
    }
}

/// Whether a submission's status is forwarded to the status sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyPolicy {
    /// Track the transaction and push every status to the sink.
    #[default]
    Track,
    /// Submit only.
    Skip,
}

impl NotifyPolicy {
    /// Build from the `notify_by_default` flag.
    pub fn from_flag(notify: bool) -> Self {
        if notify {
            Self::Track
        } else {
            Self::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_pads() {
        assert_eq!(Address::new(0x1).to_string(), "0x0000000000000001");
    }

    #[test]
    fn test_address_parse_forms() {
        let full: Address = "0x5d572e6f1bd2f5da".parse().unwrap();
        let bare: Address = "5d572e6f1bd2f5da".parse().unwrap();
        let short: Address = "0x01".parse().unwrap();
        assert_eq!(full, bare);
        assert_eq!(short, Address::new(1));
    }

    #[test]
    fn test_address_parse_rejects_garbage() {
        assert!("0x".parse::<Address>().is_err());
        assert!("0xzz".parse::<Address>().is_err());
        assert!("0x11111111111111111".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_serde_as_string() {
        let json = serde_json::to_string(&Address::new(0xabc)).unwrap();
        assert_eq!(json, "\"0x0000000000000abc\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Address::new(0xabc));
    }

    #[test]
    fn test_status_terminal() {
        assert!(TransactionStatus::Sealed.is_terminal());
        assert!(TransactionStatus::Errored.is_terminal());
        assert!(TransactionStatus::Expired.is_terminal());
        assert!(!TransactionStatus::Executed.is_terminal());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(TransactionStatus::from_code(1), TransactionStatus::Pending);
        assert_eq!(TransactionStatus::from_code(4), TransactionStatus::Sealed);
        assert_eq!(TransactionStatus::from_code(9), TransactionStatus::Unknown);
        assert!(
            TransactionStatus::Finalized.lifecycle_rank()
                < TransactionStatus::Sealed.lifecycle_rank()
        );
    }

    #[test]
    fn test_identity_authorized_address() {
        let user = UserIdentity::authenticated(Address::new(7));
        assert_eq!(user.authorized_address(), Some(Address::new(7)));

        let stale = UserIdentity {
            logged_in: false,
            ..user
        };
        assert_eq!(stale.authorized_address(), None);
        assert_eq!(UserIdentity::unauthenticated().authorized_address(), None);
    }

    #[test]
    fn test_identity_deserializes_provider_shape() {
        let json = r#"{"addr":"0x0000000000000007","loggedIn":true,"cid":null,"expiresAt":null}"#;
        let user: UserIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(user, UserIdentity::authenticated(Address::new(7)));
    }
}
