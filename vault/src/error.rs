//! # Vault Errors
//!
//! One flat enum for everything a vault operation can fail with. Each
//! variant belongs to one of five [`ErrorKind`]s so integrators can branch on
//! the cause without matching every variant, and each has a stable
//! [`reason`](VaultError::reason) string that integrators can match on.
//!
//! Every error aborts the whole operation. There is no partial effect to
//! recover from.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::asset::Asset;
use crate::chain::ChainError;
use crate::ledger::{Amount, LedgerError};
use crate::token::{CallFailure, TokenCall};

/// Coarse classification of a [`VaultError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The operation was invoked with amount 0.
    ZeroAmount,
    /// The transfer target is the zero address or the vault itself.
    InvalidDestination,
    /// A balance (ledger entry or external holding) is too small.
    InsufficientBalance,
    /// An external call did not report success.
    ExternalCallFailure,
    /// A credit would exceed the representable range.
    ArithmeticOverflow,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ZeroAmount => "zero_amount",
            ErrorKind::InvalidDestination => "invalid_destination",
            ErrorKind::InsufficientBalance => "insufficient_balance",
            ErrorKind::ExternalCallFailure => "external_call_failure",
            ErrorKind::ArithmeticOverflow => "arithmetic_overflow",
        };
        f.write_str(name)
    }
}

/// Errors returned by [`CipherVault`](crate::vault::CipherVault) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// Deposit of zero.
    #[error("Deposit amount must be greater than zero")]
    DepositAmountZero,

    /// Withdrawal of zero.
    #[error("Withdraw amount must be greater than zero")]
    WithdrawAmountZero,

    /// Internal transfer of zero.
    #[error("Transfer amount must be greater than zero")]
    TransferAmountZero,

    /// Internal transfer to the zero address.
    #[error("Cannot transfer to the zero address")]
    TransferToZeroAddress,

    /// Internal transfer to the vault's own address.
    #[error("Cannot transfer to the vault address")]
    TransferToVault,

    /// The caller's ledger entry is smaller than the requested amount.
    #[error("insufficient {asset} balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Asset being debited.
        asset: Asset,
        /// Account being debited.
        account: Address,
        /// Current ledger entry.
        available: Amount,
        /// Requested amount.
        requested: Amount,
    },

    /// The depositor's external token holding is smaller than the deposit.
    #[error("insufficient token balance: {token} holding {available}, requested {requested}")]
    InsufficientTokenBalance {
        /// The token being deposited.
        token: Address,
        /// The depositor's external holding.
        available: Amount,
        /// Requested deposit.
        requested: Amount,
    },

    /// The depositor has not approved the vault for enough tokens.
    #[error("insufficient allowance: {token} allowance {allowance}, requested {requested}")]
    InsufficientAllowance {
        /// The token being deposited.
        token: Address,
        /// Allowance granted to the vault.
        allowance: Amount,
        /// Requested deposit.
        requested: Amount,
    },

    /// A token call did not report success.
    #[error("token {token} {call} failed: {failure}")]
    TokenCallFailed {
        /// The token contract called.
        token: Address,
        /// Which call failed.
        call: TokenCall,
        /// How it failed.
        failure: CallFailure,
    },

    /// Paying out native currency failed.
    #[error("native transfer of {amount} to {to} failed: {source}")]
    NativeTransferFailed {
        /// Intended recipient.
        to: Address,
        /// Amount being paid out.
        amount: Amount,
        /// The substrate's reason.
        source: ChainError,
    },

    /// A ledger credit would overflow.
    #[error("arithmetic overflow crediting {amount} of {asset} to {account}")]
    ArithmeticOverflow {
        /// Asset being credited.
        asset: Asset,
        /// Account being credited.
        account: Address,
        /// Amount that overflowed.
        amount: Amount,
    },

    /// After the operation the vault would owe more than it holds.
    #[error("solvency violation for {asset}: owes {owed}, holds {held}")]
    SolvencyViolation {
        /// The affected asset.
        asset: Asset,
        /// Sum of ledger entries.
        owed: Amount,
        /// External holding.
        held: Amount,
    },

    /// The substrate refused the call (depth limit, unfunded value, ...).
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl VaultError {
    /// The coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::DepositAmountZero
            | VaultError::WithdrawAmountZero
            | VaultError::TransferAmountZero => ErrorKind::ZeroAmount,
            VaultError::TransferToZeroAddress | VaultError::TransferToVault => {
                ErrorKind::InvalidDestination
            }
            VaultError::InsufficientBalance { .. } | VaultError::InsufficientTokenBalance { .. } => {
                ErrorKind::InsufficientBalance
            }
            VaultError::InsufficientAllowance { .. }
            | VaultError::TokenCallFailed { .. }
            | VaultError::NativeTransferFailed { .. }
            | VaultError::SolvencyViolation { .. }
            | VaultError::Chain(_) => ErrorKind::ExternalCallFailure,
            VaultError::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
        }
    }

    /// Stable, short reason string suitable for matching by integrators.
    pub fn reason(&self) -> &'static str {
        match self {
            VaultError::DepositAmountZero => "Deposit amount must be greater than zero",
            VaultError::WithdrawAmountZero => "Withdraw amount must be greater than zero",
            VaultError::TransferAmountZero => "Transfer amount must be greater than zero",
            VaultError::TransferToZeroAddress => "Cannot transfer to the zero address",
            VaultError::TransferToVault => "Cannot transfer to the vault address",
            VaultError::InsufficientBalance { asset, .. } => {
                if asset.is_native() {
                    "Insufficient ether balance"
                } else {
                    "Insufficient token balance"
                }
            }
            VaultError::InsufficientTokenBalance { .. } => "Insufficient token balance",
            VaultError::InsufficientAllowance { .. } => "Insufficient token allowance",
            VaultError::TokenCallFailed {
                call: TokenCall::TransferFrom,
                ..
            } => "Token transfer from caller failed",
            VaultError::TokenCallFailed {
                call: TokenCall::Transfer,
                ..
            } => "Token transfer to caller failed",
            VaultError::NativeTransferFailed { .. } => "Ether transfer failed",
            VaultError::ArithmeticOverflow { .. } => "Balance overflow",
            VaultError::SolvencyViolation { .. } => "Vault holdings below liabilities",
            VaultError::Chain(_) => "Call rejected by host",
        }
    }
}

impl From<LedgerError> for VaultError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance {
                asset,
                account,
                available,
                requested,
            } => VaultError::InsufficientBalance {
                asset,
                account,
                available,
                requested,
            },
            LedgerError::Overflow {
                asset,
                account,
                credit,
                ..
            } => VaultError::ArithmeticOverflow {
                asset,
                account,
                amount: credit,
            },
        }
    }
}
