//! # Cadence Templates
//!
//! Fixed transaction and script sources for the Buzz chip contract.
//!
//! Imports use placeholder addresses (`0xNonFungibleToken`, `0xBuzz4`) that are
//! replaced with the configured contract addresses at render time. Arguments
//! are never interpolated into source; they travel as JSON-Cadence values.

use serde::{Deserialize, Serialize};

use super::value_objects::Address;

/// Placeholder for the NonFungibleToken standard contract.
pub const NFT_PLACEHOLDER: &str = "0xNonFungibleToken";

/// Placeholder for the Buzz chip contract.
pub const BUZZ_PLACEHOLDER: &str = "0xBuzz4";

/// Message the scripts panic with when the public collection is missing.
pub const MISSING_CAPABILITY_MESSAGE: &str =
    "Could not borrow capability from the public Buzz4 Collection";

/// Deployed contract addresses the templates import from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// NonFungibleToken standard.
    pub non_fungible_token: Address,
    /// Buzz4 chip contract.
    pub buzz: Address,
}

/// Replace import placeholders with real addresses.
pub fn render(template: &str, contracts: &ContractAddresses) -> String {
    template
        .replace(NFT_PLACEHOLDER, &contracts.non_fungible_token.to_string())
        .replace(BUZZ_PLACEHOLDER, &contracts.buzz.to_string())
}

// =============================================================================
// Transactions
// =============================================================================

pub(crate) const INIT_ACCOUNT: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

transaction {
    prepare(acct: AuthAccount) {
        if acct.borrow<&Buzz4.Collection>(from: /storage/BuzzCollection) == nil {
            let collection <- Buzz4.createEmptyCollection()
            acct.save(<-collection, to: /storage/BuzzCollection)
            acct.link<&{Buzz4.BuzzCollectionPublic}>(
                /public/BuzzCollectionPublic,
                target: /storage/BuzzCollection
            )
        }
    }
}
"#;

pub(crate) const RESET_ACCOUNT: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

transaction {
    prepare(acct: AuthAccount) {
        let collection <- acct.load<@Buzz4.Collection>(from: /storage/BuzzCollection)
        destroy collection
    }
}
"#;

pub(crate) const CREATE_CHIP: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

transaction(name: String, companyId: UInt64, password: String) {
    let collection: &Buzz4.Collection

    prepare(acct: AuthAccount) {
        self.collection = acct.borrow<&Buzz4.Collection>(from: /storage/BuzzCollection)
            ?? panic("Could not borrow Buzz4 Collection")
    }

    execute {
        let chip <- Buzz4.createChip(name: name, companyId: companyId, password: password)
        self.collection.deposit(token: <-chip)
    }
}
"#;

pub(crate) const EDIT_PUBLIC_INFO: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

transaction(id: UInt64, newContent: {String: String}) {
    let collection: &Buzz4.Collection

    prepare(acct: AuthAccount) {
        self.collection = acct.borrow<&Buzz4.Collection>(from: /storage/BuzzCollection)
            ?? panic("Could not borrow Buzz4 Collection")
    }

    execute {
        let chip = self.collection.borrowChip(id: id)
        chip.editPublicData(info: newContent)
    }
}
"#;

pub(crate) const EDIT_PRIVATE_INFO: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

transaction(id: UInt64, newContent: String, password: String) {
    let collection: &Buzz4.Collection

    prepare(acct: AuthAccount) {
        self.collection = acct.borrow<&Buzz4.Collection>(from: /storage/BuzzCollection)
            ?? panic("Could not borrow Buzz4 Collection")
    }

    execute {
        let chip = self.collection.borrowChip(id: id)
        chip.editPrivateData(info: newContent, password: password)
    }
}
"#;

pub(crate) const EDIT_NAME: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

transaction(id: UInt64, newName: String) {
    let collection: &Buzz4.Collection

    prepare(acct: AuthAccount) {
        self.collection = acct.borrow<&Buzz4.Collection>(from: /storage/BuzzCollection)
            ?? panic("Could not borrow Buzz4 Collection")
    }

    execute {
        let chip = self.collection.borrowChip(id: id)
        chip.editName(name: newName)
    }
}
"#;

// =============================================================================
// Scripts
// =============================================================================

pub(crate) const FETCH_ALL: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

pub fun main(account: Address): {UInt64: AnyStruct} {
    let collection = getAccount(account)
        .getCapability<&{Buzz4.BuzzCollectionPublic}>(/public/BuzzCollectionPublic)
        .borrow()
        ?? panic("Could not borrow capability from the public Buzz4 Collection")

    return collection.getInfo()
}
"#;

pub(crate) const FETCH_PUBLIC: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

pub fun main(id: UInt64, account: Address): {String: AnyStruct} {
    let collection = getAccount(account)
        .getCapability<&{Buzz4.BuzzCollectionPublic}>(/public/BuzzCollectionPublic)
        .borrow()
        ?? panic("Could not borrow capability from the public Buzz4 Collection")

    return collection.borrowChip(id: id).getInfo()
}
"#;

pub(crate) const FETCH_PRIVATE: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

pub fun main(id: UInt64, account: Address): {String: AnyStruct} {
    let collection = getAccount(account)
        .getCapability<&{Buzz4.BuzzCollectionPublic}>(/public/BuzzCollectionPublic)
        .borrow()
        ?? panic("Could not borrow capability from the public Buzz4 Collection")

    return collection.borrowChip(id: id).getPrivateInfo()
}
"#;

pub(crate) const FETCH_AS_OWNER: &str = r#"
import NonFungibleToken from 0xNonFungibleToken
import Buzz4 from 0xBuzz4

pub fun main(id: UInt64, account: Address): {String: AnyStruct} {
    let collection = getAccount(account)
        .getCapability<&{Buzz4.BuzzCollectionPublic}>(/public/BuzzCollectionPublic)
        .borrow()
        ?? panic("Could not borrow capability from the public Buzz4 Collection")

    return collection.borrowChip(id: id).userGetInfo()
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn contracts() -> ContractAddresses {
        ContractAddresses {
            non_fungible_token: Address::new(0x631e88ae7f1d7c20),
            buzz: Address::new(0x5d572e6f1bd2f5da),
        }
    }

    #[test]
    fn test_render_replaces_imports() {
        let source = render(CREATE_CHIP, &contracts());
        assert!(source.contains("import NonFungibleToken from 0x631e88ae7f1d7c20"));
        assert!(source.contains("import Buzz4 from 0x5d572e6f1bd2f5da"));
        assert!(!source.contains(NFT_PLACEHOLDER));
        assert!(!source.contains(BUZZ_PLACEHOLDER));
    }

    #[test]
    fn test_buzz_placeholder_does_not_clobber_type_names() {
        // `Buzz4.Collection` must survive; only the `0x`-prefixed import is swapped.
        let source = render(INIT_ACCOUNT, &contracts());
        assert!(source.contains("Buzz4.Collection"));
    }

    #[test]
    fn test_scripts_share_capability_message() {
        for script in [FETCH_ALL, FETCH_PUBLIC, FETCH_PRIVATE, FETCH_AS_OWNER] {
            assert!(script.contains(MISSING_CAPABILITY_MESSAGE));
        }
    }

    #[test]
    fn test_owner_script_takes_id_and_account() {
        assert!(FETCH_AS_OWNER.contains("main(id: UInt64, account: Address)"));
    }
}
