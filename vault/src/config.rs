//! # Vault Configuration & Constants
//!
//! Every magic number in the vault lives here, next to the runtime
//! [`VaultConfig`] knobs that an operator may change per deployment.
//!
//! Constants describe the substrate the vault runs on (address width, native
//! precision, call depth). `VaultConfig` describes how a single vault
//! instance treats the outside world: how much it trusts token return values
//! and whether it re-checks solvency after every operation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::Amount;

// ---------------------------------------------------------------------------
// Substrate Parameters
// ---------------------------------------------------------------------------

/// Width of an account or contract address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Decimal places of the native currency. Display only: the ledger never
/// divides.
pub const NATIVE_DECIMALS: u8 = 18;

/// One whole unit of the native currency in its smallest denomination.
pub const ONE_NATIVE: Amount = 1_000_000_000_000_000_000;

/// Human-readable symbol for the native currency, used in reason strings and
/// reports.
pub const NATIVE_SYMBOL: &str = "ether";

/// Maximum nesting of call frames. A frame beyond this depth fails instead
/// of executing, which bounds runaway reentrancy. Frames recurse on the
/// native stack and one nested vault call costs two frames, so this must
/// stay within what a default 2 MiB thread can hold.
pub const MAX_CALL_DEPTH: usize = 128;

/// Native balance handed to each scenario account at genesis (10 000 whole
/// units), matching the local development network the vault was first
/// tested against.
pub const DEFAULT_GENESIS_BALANCE: Amount = 10_000 * ONE_NATIVE;

/// Default supply minted to the holder of a freshly deployed test token
/// (1 000 000 whole units at 18 decimals).
pub const DEFAULT_TOKEN_SUPPLY: Amount = 1_000_000 * ONE_NATIVE;

/// Denominator for fee rates expressed in basis points.
pub const BASIS_POINTS: u32 = 10_000;

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// How a token call's return value is interpreted.
///
/// Tokens in the wild do not all follow the standard interface. Some return
/// nothing at all from `transfer`. Which of those the vault accepts is a
/// deployment decision, so it lives in config rather than in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenReturnPolicy {
    /// Only an explicit `true` counts as success. A call that returns no
    /// value is a failure.
    #[default]
    Strict,
    /// A call that completes without reverting and returns no value counts
    /// as success. An explicit `false` is still a failure.
    AllowEmpty,
}

/// Per-vault runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Interpretation of token call return values.
    pub token_return_policy: TokenReturnPolicy,

    /// Query the caller's token balance and allowance before attempting the
    /// delegated pull, so a certain failure surfaces with a precise reason.
    pub precheck_token_deposits: bool,

    /// Compare what the vault owes with what it actually holds after every
    /// mutating operation, and fail the operation on a shortfall.
    pub check_solvency: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            token_return_policy: TokenReturnPolicy::Strict,
            precheck_token_deposits: true,
            check_solvency: true,
        }
    }
}

/// Errors raised while loading a [`VaultConfig`] from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid JSON vault config.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl VaultConfig {
    /// Parses a config from a JSON string. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
