//! # Reentrant Token
//!
//! A standard token with a callback. When the armed vault calls `transfer`
//! (a payout) or `transfer_from` (a deposit pull), the token first invokes
//! a vault operation on behalf of the counterparty, the recipient of the
//! payout or the depositor. Only then does it move any balance.
//!
//! The hook and the attempt log live outside the chain's world state. A
//! reverted frame does not erase what the token tried, so tests can inspect
//! every nested attempt after the fact.

use parking_lot::Mutex;
use tracing::debug;

use cipher_vault::{
    Address, Amount, CallContext, CallOutcome, Chain, CipherVault, Revert, StandardToken,
    TokenContract, VaultError,
};

/// What the token does when it re-enters the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReentryAction {
    /// Withdraw `amount` of this same token again.
    WithdrawToken {
        /// Amount to withdraw.
        amount: Amount,
    },
    /// Withdraw `amount` of the native asset.
    WithdrawNative {
        /// Amount to withdraw.
        amount: Amount,
    },
    /// Move `amount` of this token's ledger entry to `to`.
    TransferToken {
        /// Recipient inside the vault.
        to: Address,
        /// Amount to move.
        amount: Amount,
    },
}

/// One nested call the token made into the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReentryAttempt {
    /// The account the nested call acted for.
    pub account: Address,
    /// What was attempted.
    pub action: ReentryAction,
    /// Chain depth at which the attempt ran.
    pub depth: usize,
    /// The vault's answer: the account's remaining entry, or the error.
    pub result: Result<Amount, VaultError>,
}

#[derive(Debug, Clone)]
struct Hook {
    vault: CipherVault,
    action: ReentryAction,
    remaining: usize,
    propagate: bool,
}

/// Standard token that re-enters the vault from its mutating calls.
#[derive(Debug)]
pub struct ReentrantToken {
    inner: StandardToken,
    hook: Mutex<Option<Hook>>,
    attempts: Mutex<Vec<ReentryAttempt>>,
}

impl ReentrantToken {
    /// Unarmed token; behaves as a standard token until [`arm`](Self::arm).
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            inner: StandardToken::new(name, symbol, decimals),
            hook: Mutex::new(None),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Re-enter `vault` with `action` on the next `times` calls made by the
    /// vault. With `propagate`, a failed nested call makes the token revert
    /// with the nested error as its reason; otherwise the token carries on
    /// with the transfer.
    pub fn arm(&self, vault: &CipherVault, action: ReentryAction, times: usize, propagate: bool) {
        *self.hook.lock() = Some(Hook {
            vault: vault.clone(),
            action,
            remaining: times,
            propagate,
        });
    }

    /// Removes the hook.
    pub fn disarm(&self) {
        *self.hook.lock() = None;
    }

    /// Every nested attempt so far, innermost first.
    pub fn attempts(&self) -> Vec<ReentryAttempt> {
        self.attempts.lock().clone()
    }

    fn reenter(&self, chain: &mut Chain, ctx: CallContext, account: Address) -> Result<(), Revert> {
        // Take what we need and drop the lock: the nested call may land
        // back here.
        let hook = {
            let mut guard = self.hook.lock();
            match guard.as_mut() {
                Some(hook) if hook.vault.address() == ctx.caller && hook.remaining > 0 => {
                    hook.remaining -= 1;
                    hook.clone()
                }
                _ => return Ok(()),
            }
        };

        let result = match hook.action {
            ReentryAction::WithdrawToken { amount } => {
                hook.vault.withdraw_token(chain, account, ctx.this, amount)
            }
            ReentryAction::WithdrawNative { amount } => {
                hook.vault.withdraw_native(chain, account, amount)
            }
            ReentryAction::TransferToken { to, amount } => hook
                .vault
                .transfer_token(chain, account, ctx.this, to, amount)
                .map(|receipt| receipt.from_balance),
        };
        debug!(token = %ctx.this, account = %account, action = ?hook.action, ok = result.is_ok(), "reentry attempt");

        let failure = result.as_ref().err().map(ToString::to_string);
        self.attempts.lock().push(ReentryAttempt {
            account,
            action: hook.action,
            depth: chain.depth(),
            result,
        });

        match failure {
            Some(reason) if hook.propagate => Err(Revert::with_reason(reason)),
            _ => Ok(()),
        }
    }
}

impl TokenContract for ReentrantToken {
    fn transfer(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        self.reenter(chain, ctx, to)?;
        self.inner.transfer(chain, ctx, to, amount)
    }

    fn transfer_from(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        self.reenter(chain, ctx, from)?;
        self.inner.transfer_from(chain, ctx, from, to, amount)
    }
}
