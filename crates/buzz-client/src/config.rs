//! # Network Configuration
//!
//! Where the client talks to and which contract deployment it targets.
//!
//! ## Environment Variables
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `BUZZ_NETWORK` | `testnet` or `mainnet` | `testnet` |
//! | `BUZZ_ACCESS_NODE` | Access node API URL | per network |
//! | `BUZZ_DISCOVERY_WALLET` | Wallet discovery URL | per network |
//! | `BUZZ_CONTRACT_ADDRESS` | Buzz4 contract address | per network |
//! | `BUZZ_NFT_CONTRACT_ADDRESS` | NonFungibleToken address | per network |
//! | `BUZZ_COMPUTE_LIMIT` | Transaction compute limit | 1000 |
//! | `BUZZ_NOTIFY` | Track submissions by default | `true` |

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{Address, BuzzError, ContractAddresses, NotifyPolicy, DEFAULT_COMPUTE_LIMIT};

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `BUZZ_NETWORK` names no known deployment.
    #[error("Unknown network: {0} (expected testnet or mainnet)")]
    UnknownNetwork(String),

    /// A contract address could not be parsed.
    #[error("Invalid address in {field}: {value}")]
    InvalidAddress {
        /// Setting that held the value
        field: &'static str,
        /// Raw value
        value: String,
    },

    /// No address is known for a contract on this network.
    #[error("No {0} contract address configured for this network")]
    MissingContract(&'static str),

    /// A setting had an unusable value.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Setting that held the value
        field: &'static str,
        /// Raw value
        value: String,
    },
}

impl From<ConfigError> for BuzzError {
    fn from(error: ConfigError) -> Self {
        BuzzError::Configuration(error.to_string())
    }
}

/// Deployment environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Public test network.
    #[default]
    Testnet,
    /// Production network.
    Mainnet,
}

impl Environment {
    /// Default access node API.
    pub fn access_node_api(&self) -> &'static str {
        match self {
            Self::Testnet => "https://testnet.onflow.org",
            Self::Mainnet => "https://mainnet.onflow.org",
        }
    }

    /// Default wallet discovery endpoint.
    pub fn discovery_wallet(&self) -> &'static str {
        match self {
            Self::Testnet => "https://fcl-discovery.onflow.org/testnet/authn",
            Self::Mainnet => "https://fcl-discovery.onflow.org/authn",
        }
    }

    /// NonFungibleToken standard contract.
    pub fn non_fungible_token(&self) -> Address {
        match self {
            Self::Testnet => Address::new(0x631e88ae7f1d7c20),
            Self::Mainnet => Address::new(0x1d7e57aa55817448),
        }
    }

    /// Buzz4 deployment, where one is known.
    pub fn buzz_contract(&self) -> Option<Address> {
        match self {
            Self::Testnet => Some(Address::new(0x5d572e6f1bd2f5da)),
            Self::Mainnet => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testnet => f.write_str("testnet"),
            Self::Mainnet => f.write_str("mainnet"),
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Network target and submission defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Deployment environment.
    pub environment: Environment,
    /// Access node API URL.
    pub access_node_api: String,
    /// Wallet discovery URL.
    pub discovery_wallet: String,
    /// NonFungibleToken address.
    pub non_fungible_token: Address,
    /// Buzz4 address. Must be set before use on networks without a known deployment.
    pub buzz_contract: Option<Address>,
    /// Compute limit attached to every transaction.
    pub compute_limit: u64,
    /// Whether submissions are tracked unless the call says otherwise.
    pub notify_by_default: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Testnet)
    }
}

impl NetworkConfig {
    /// Defaults for an environment.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            access_node_api: environment.access_node_api().to_string(),
            discovery_wallet: environment.discovery_wallet().to_string(),
            non_fungible_token: environment.non_fungible_token(),
            buzz_contract: environment.buzz_contract(),
            compute_limit: DEFAULT_COMPUTE_LIMIT,
            notify_by_default: true,
        }
    }

    /// Create a config for testing (local emulator addresses).
    pub fn for_testing() -> Self {
        Self {
            environment: Environment::Testnet,
            access_node_api: "http://localhost:8888".to_string(),
            discovery_wallet: "http://localhost:8701/fcl/authn".to_string(),
            non_fungible_token: Address::new(0xf8d6e0586b0a20c7),
            buzz_contract: Some(Address::new(0xf8d6e0586b0a20c7)),
            compute_limit: 100,
            notify_by_default: true,
        }
    }

    /// Load from `BUZZ_*` environment variables on top of network defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("BUZZ_NETWORK") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };
        let mut config = Self::for_environment(environment);

        if let Ok(url) = env::var("BUZZ_ACCESS_NODE") {
            config.access_node_api = url;
        }
        if let Ok(url) = env::var("BUZZ_DISCOVERY_WALLET") {
            config.discovery_wallet = url;
        }
        if let Ok(value) = env::var("BUZZ_CONTRACT_ADDRESS") {
            config.buzz_contract = Some(parse_address("BUZZ_CONTRACT_ADDRESS", &value)?);
        }
        if let Ok(value) = env::var("BUZZ_NFT_CONTRACT_ADDRESS") {
            config.non_fungible_token = parse_address("BUZZ_NFT_CONTRACT_ADDRESS", &value)?;
        }
        if let Ok(value) = env::var("BUZZ_COMPUTE_LIMIT") {
            config.compute_limit = value.parse().map_err(|_| ConfigError::InvalidValue {
                field: "BUZZ_COMPUTE_LIMIT",
                value: value.clone(),
            })?;
        }
        if let Ok(value) = env::var("BUZZ_NOTIFY") {
            config.notify_by_default = value.to_lowercase() != "false" && value != "0";
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the config is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buzz_contract.is_none() {
            return Err(ConfigError::MissingContract("Buzz4"));
        }
        if self.compute_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "compute_limit",
                value: "0".to_string(),
            });
        }
        if self.access_node_api.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "access_node_api",
                value: String::new(),
            });
        }
        Ok(())
    }

    /// Contract addresses for template rendering.
    pub fn contracts(&self) -> Result<ContractAddresses, ConfigError> {
        let buzz = self
            .buzz_contract
            .ok_or(ConfigError::MissingContract("Buzz4"))?;
        Ok(ContractAddresses {
            non_fungible_token: self.non_fungible_token,
            buzz,
        })
    }

    /// Policy applied to submissions that do not choose one.
    pub fn default_notify_policy(&self) -> NotifyPolicy {
        NotifyPolicy::from_flag(self.notify_by_default)
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}
