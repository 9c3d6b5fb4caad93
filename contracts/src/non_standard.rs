//! # Non-Standard Tokens
//!
//! Tokens that break the return-value contract of the standard interface:
//!
//! ```text
//! NoReturnToken      moves funds, returns nothing
//! FalseReturnToken   returns false instead of moving funds
//! SilentRevertToken  reverts with no reason
//! ```
//!
//! The last two only misbehave on the calls selected by [`FailOn`] and act
//! like a standard token otherwise, so a vault can be funded with them
//! before the failure is triggered.

use tracing::trace;

use cipher_vault::{
    Address, Amount, CallContext, CallOutcome, Chain, Revert, StandardToken, TokenContract,
};

/// Which mutating calls a faulty token fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailOn {
    /// Only `transfer` (vault payouts).
    Transfer,
    /// Only `transfer_from` (vault deposit pulls).
    TransferFrom,
    /// Every mutating call.
    #[default]
    Both,
}

impl FailOn {
    fn transfer(self) -> bool {
        matches!(self, FailOn::Transfer | FailOn::Both)
    }

    fn transfer_from(self) -> bool {
        matches!(self, FailOn::TransferFrom | FailOn::Both)
    }
}

// ---------------------------------------------------------------------------
// NoReturnToken
// ---------------------------------------------------------------------------

/// Moves balances like a standard token but returns no boolean. Reverts on
/// insufficient balance or allowance.
#[derive(Debug, Clone)]
pub struct NoReturnToken {
    inner: StandardToken,
}

impl NoReturnToken {
    /// Standard moves, no return value.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            inner: StandardToken::new(name, symbol, decimals),
        }
    }
}

impl TokenContract for NoReturnToken {
    fn transfer(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        self.inner.transfer(chain, ctx, to, amount).map(|_| None)
    }

    fn transfer_from(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        self.inner
            .transfer_from(chain, ctx, from, to, amount)
            .map(|_| None)
    }
}

// ---------------------------------------------------------------------------
// FalseReturnToken
// ---------------------------------------------------------------------------

/// Returns `false` and moves nothing on the calls selected by [`FailOn`].
#[derive(Debug, Clone)]
pub struct FalseReturnToken {
    inner: StandardToken,
    fail_on: FailOn,
}

impl FalseReturnToken {
    /// Returns `false` and moves nothing on the calls `fail_on` selects.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        fail_on: FailOn,
    ) -> Self {
        Self {
            inner: StandardToken::new(name, symbol, decimals),
            fail_on,
        }
    }
}

impl TokenContract for FalseReturnToken {
    fn transfer(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        if self.fail_on.transfer() {
            trace!(token = %ctx.this, "transfer returning false");
            return Ok(Some(false));
        }
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
        if self.fail_on.transfer_from() {
            trace!(token = %ctx.this, "transferFrom returning false");
            return Ok(Some(false));
        }
        self.inner.transfer_from(chain, ctx, from, to, amount)
    }
}

// ---------------------------------------------------------------------------
// SilentRevertToken
// ---------------------------------------------------------------------------

/// Reverts without a reason on the calls selected by [`FailOn`]. Moves any
/// balances first, so the revert has something to undo.
#[derive(Debug, Clone)]
pub struct SilentRevertToken {
    inner: StandardToken,
    fail_on: FailOn,
}

impl SilentRevertToken {
    /// Performs the move, then reverts without a reason on the calls
    /// `fail_on` selects.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        fail_on: FailOn,
    ) -> Self {
        Self {
            inner: StandardToken::new(name, symbol, decimals),
            fail_on,
        }
    }
}

impl TokenContract for SilentRevertToken {
    fn transfer(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        let outcome = self.inner.transfer(chain, ctx, to, amount)?;
        if self.fail_on.transfer() {
            return Err(Revert::silent());
        }
        Ok(outcome)
    }

    fn transfer_from(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        let outcome = self.inner.transfer_from(chain, ctx, from, to, amount)?;
        if self.fail_on.transfer_from() {
            return Err(Revert::silent());
        }
        Ok(outcome)
    }
}
