//! # Assets
//!
//! The vault custodies two kinds of asset: the native currency, which moves
//! with a call's attached value, and fungible tokens, which move only by
//! calling their contract. An [`Asset`] names one of them. The native asset
//! carries no address, so it can never alias a token.
//!
//! Like [`Address`], an asset serializes as a plain string (`"native"` or the
//! token's hex address) so it can key JSON maps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::{Address, AddressError};

/// Textual tag for the native asset.
const NATIVE_TAG: &str = "native";

/// An asset the vault can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Asset {
    /// The platform's base currency.
    Native,
    /// A fungible token, identified by its contract address.
    Token(Address),
}

impl Asset {
    /// Returns `true` for the native currency.
    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// The token contract address, or `None` for the native currency.
    pub fn token_address(&self) -> Option<Address> {
        match self {
            Asset::Native => None,
            Asset::Token(address) => Some(*address),
        }
    }
}

impl From<Address> for Asset {
    fn from(token: Address) -> Self {
        Asset::Token(token)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str(NATIVE_TAG),
            Asset::Token(address) => write!(f, "{}", address),
        }
    }
}

impl FromStr for Asset {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(NATIVE_TAG) {
            Ok(Asset::Native)
        } else {
            Address::from_hex(s).map(Asset::Token)
        }
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
