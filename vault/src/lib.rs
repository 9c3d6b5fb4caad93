// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Cipher Vault Core Library
//!
//! A custodial vault contract. Accounts deposit the native currency or any
//! fungible token into the vault, move balances between each other inside
//! the vault without touching the underlying asset, and withdraw back out.
//!
//! The vault trusts nothing it calls. Token contracts may revert, return
//! `false`, return nothing, skim fees, or call straight back into the vault
//! mid-operation. Recipients of native payouts may refuse them. Every one of
//! those cases leaves the ledger exactly as it was.
//!
//! ## Architecture
//!
//! - **address**: 20-byte account and contract identifiers.
//! - **asset**: `Native` or `Token(address)`, the ledger's first key.
//! - **ledger**: Per-asset, per-account balances with checked arithmetic.
//! - **token**: The token capability interface and the standard token.
//! - **chain**: In-memory host: native balances, token storage, call
//!   frames with rollback.
//! - **vault**: The contract: native and token handlers, transfer engine,
//!   solvency checks.
//! - **error**: The error taxonomy every operation reports through.
//! - **config**: Constants and per-vault settings.
//! - **units**: Decimal string to smallest-unit conversion.
//!
//! ## Invariants
//!
//! 1. For every asset, the vault holds at least what its ledger owes.
//! 2. A failed operation changes nothing.
//! 3. Ledger writes that reduce a balance happen before any external call.

pub mod address;
pub mod asset;
pub mod chain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod token;
pub mod units;
pub mod vault;

pub use address::Address;
pub use asset::Asset;
pub use chain::{Chain, ChainError};
pub use config::{TokenReturnPolicy, VaultConfig};
pub use error::{ErrorKind, VaultError};
pub use ledger::{Amount, Ledger};
pub use token::{
    CallContext, CallFailure, CallOutcome, Revert, StandardToken, TokenCall, TokenClient,
    TokenContract, TokenState,
};
pub use vault::{AssetPosition, CipherVault, SolvencyReport, TransferReceipt};
