//! # Addresses
//!
//! Accounts and contracts share one identity space: an opaque 20-byte
//! [`Address`]. The vault never interprets an address beyond two checks,
//! "is it the zero address" and "is it me", so this type stays deliberately
//! thin.
//!
//! Addresses render as `0x`-prefixed lowercase hex and serialize as that
//! string, which lets them key JSON maps directly.
//!
//! Contract addresses are derived deterministically from the deployer and a
//! per-deployer nonce, `BLAKE3(deployer || nonce_le)[..20]`. Scenario and
//! test accounts are derived from a human label the same way, so that
//! `Address::from_label("alice")` is stable across runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::ADDRESS_LENGTH;

/// Errors raised when parsing an address from text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AddressError {
    /// The input is not valid hex.
    #[error("invalid address hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The input decoded to the wrong number of bytes.
    #[error("invalid address length: expected {ADDRESS_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
}

/// A 20-byte account or contract identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The null identity. Never a valid transfer destination.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wraps raw address bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Returns `true` for the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses hex with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits)?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Deterministic address for a human-readable label.
    pub fn from_label(label: &str) -> Self {
        let mut preimage = Vec::with_capacity(label.len() + 8);
        preimage.extend_from_slice(b"account\x00");
        preimage.extend_from_slice(label.as_bytes());
        Self::truncate(blake3::hash(&preimage).as_bytes())
    }

    /// Address of the `nonce`-th contract deployed by `deployer`.
    pub fn derive_contract(deployer: &Address, nonce: u64) -> Self {
        let mut preimage = Vec::with_capacity(9 + ADDRESS_LENGTH + 8);
        preimage.extend_from_slice(b"contract\x00");
        preimage.extend_from_slice(&deployer.0);
        preimage.extend_from_slice(&nonce.to_le_bytes());
        Self::truncate(blake3::hash(&preimage).as_bytes())
    }

    fn truncate(digest: &[u8; 32]) -> Self {
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&digest[..ADDRESS_LENGTH]);
        Self(arr)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(self.0);
        write!(f, "Address(0x{}..{})", &hex[..6], &hex[hex.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_label("alice").is_zero());
    }

    #[test]
    fn hex_roundtrip_with_and_without_prefix() {
        let addr = Address::from_label("alice");
        let hex = addr.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 2 + ADDRESS_LENGTH * 2);
        assert_eq!(Address::from_hex(&hex).unwrap(), addr);
        assert_eq!(Address::from_hex(&hex[2..]).unwrap(), addr);
    }

    #[test]
    fn wrong_length_rejected() {
        let err = Address::from_hex("0xdeadbeef").unwrap_err();
        assert_eq!(err, AddressError::InvalidLength(4));
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(matches!(
            Address::from_hex("0xzz"),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn hex_errors_compare_and_display() {
        let err = "0xzz".parse::<Address>().unwrap_err();
        assert_eq!(err, Address::from_hex("zz").unwrap_err());
        assert!(err.to_string().starts_with("invalid address hex"));
    }

    #[test]
    fn labels_are_stable_and_distinct() {
        assert_eq!(Address::from_label("bob"), Address::from_label("bob"));
        assert_ne!(Address::from_label("bob"), Address::from_label("carol"));
    }

    #[test]
    fn contract_addresses_depend_on_nonce() {
        let deployer = Address::from_label("deployer");
        let first = Address::derive_contract(&deployer, 0);
        let second = Address::derive_contract(&deployer, 1);
        assert_ne!(first, second);
        assert_ne!(first, deployer);
    }

    #[test]
    fn serializes_as_hex_string() {
        let addr = Address::from_label("alice");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
