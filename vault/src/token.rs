//! # Token Capability Interface
//!
//! The vault knows nothing about a token beyond a narrow capability: move
//! funds on the caller's behalf (`transfer`), move pre-approved funds from
//! someone else (`transfer_from`), and answer balance and allowance queries.
//! Everything behind that interface is untrusted.
//!
//! ## Return Values
//!
//! A mutating token call produces a [`CallOutcome`]:
//!
//! ```text
//! Ok(Some(true))   explicit success
//! Ok(Some(false))  explicit failure
//! Ok(None)         completed, but returned nothing
//! Err(Revert)      reverted, with or without a reason
//! ```
//!
//! [`interpret`] turns an outcome into success or a [`CallFailure`] under the
//! vault's [`TokenReturnPolicy`]. Under the default strict policy only
//! `Some(true)` is success.
//!
//! ## Storage
//!
//! Token storage lives in the chain's world state as a [`TokenState`], the
//! standard fungible bookkeeping (balances, allowances, supply). Any token
//! implementation, conforming or not, reads and writes through it, which is
//! also what lets the chain snapshot and roll it back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::chain::{Chain, ChainError};
use crate::config::TokenReturnPolicy;
use crate::ledger::Amount;

// ---------------------------------------------------------------------------
// Call plumbing
// ---------------------------------------------------------------------------

/// Result of a mutating token call.
pub type CallOutcome = Result<Option<bool>, Revert>;

/// A reverted call, optionally carrying a reason string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .reason.as_deref().unwrap_or("reverted without reason"))]
pub struct Revert {
    /// The revert reason, if the callee supplied one.
    pub reason: Option<String>,
}

impl Revert {
    /// A revert with a reason string.
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }

    /// A revert with no reason at all.
    pub fn silent() -> Self {
        Self { reason: None }
    }
}

impl From<ChainError> for Revert {
    fn from(err: ChainError) -> Self {
        Self::with_reason(err.to_string())
    }
}

impl From<TokenStateError> for Revert {
    fn from(err: TokenStateError) -> Self {
        Self::with_reason(err.to_string())
    }
}

/// Who is calling which contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// The contract being executed.
    pub this: Address,
    /// The immediate caller (account or contract).
    pub caller: Address,
}

/// The mutating token calls the vault makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCall {
    /// Direct push from the vault's holding.
    Transfer,
    /// Delegated pull from a depositor's holding.
    TransferFrom,
}

impl fmt::Display for TokenCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenCall::Transfer => write!(f, "transfer"),
            TokenCall::TransferFrom => write!(f, "transferFrom"),
        }
    }
}

/// Why a token call did not count as a success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallFailure {
    /// The call reverted.
    #[error("reverted: {0}")]
    Reverted(Revert),
    /// The call returned an explicit `false`.
    #[error("returned false")]
    ReturnedFalse,
    /// The call returned no value and the policy requires one.
    #[error("returned no value")]
    NoReturnValue,
}

/// Interprets a call outcome under `policy`. Absence of an explicit success
/// signal is a failure unless the policy says otherwise.
pub fn interpret(outcome: CallOutcome, policy: TokenReturnPolicy) -> Result<(), CallFailure> {
    match outcome {
        Ok(Some(true)) => Ok(()),
        Ok(Some(false)) => Err(CallFailure::ReturnedFalse),
        Ok(None) => match policy {
            TokenReturnPolicy::Strict => Err(CallFailure::NoReturnValue),
            TokenReturnPolicy::AllowEmpty => Ok(()),
        },
        Err(revert) => Err(CallFailure::Reverted(revert)),
    }
}

// ---------------------------------------------------------------------------
// TokenContract
// ---------------------------------------------------------------------------

/// Code of a fungible token contract.
///
/// Implementations are stateless; their storage is the [`TokenState`] at
/// `ctx.this` in the chain. `approve`, `balance_of` and `allowance` default
/// to the standard behavior over that storage.
pub trait TokenContract: fmt::Debug + Send + Sync {
    /// Moves `amount` from `ctx.caller` to `to`.
    fn transfer(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        to: Address,
        amount: Amount,
    ) -> CallOutcome;

    /// Moves `amount` from `from` to `to`, spending the allowance `from`
    /// granted to `ctx.caller`.
    fn transfer_from(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> CallOutcome;

    /// Lets `spender` pull up to `amount` from `ctx.caller`.
    fn approve(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        spender: Address,
        amount: Amount,
    ) -> CallOutcome {
        chain
            .token_state_mut(ctx.this)?
            .approve(ctx.caller, spender, amount);
        Ok(Some(true))
    }

    /// Balance of `owner` in the token at `this`.
    fn balance_of(&self, chain: &Chain, this: Address, owner: Address) -> Amount {
        chain
            .token_state(this)
            .map(|state| state.balance_of(owner))
            .unwrap_or(0)
    }

    /// Remaining allowance `owner` granted to `spender`.
    fn allowance(&self, chain: &Chain, this: Address, owner: Address, spender: Address) -> Amount {
        chain
            .token_state(this)
            .map(|state| state.allowance(owner, spender))
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// TokenState
// ---------------------------------------------------------------------------

/// Errors raised by [`TokenState`] bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenStateError {
    /// The holder does not have enough tokens.
    #[error("ERC20: transfer amount exceeds balance ({balance} < {amount})")]
    InsufficientBalance {
        /// Current balance of the holder.
        balance: Amount,
        /// Amount the operation needed.
        amount: Amount,
    },

    /// The spender's allowance is too small.
    #[error("ERC20: insufficient allowance ({allowance} < {amount})")]
    InsufficientAllowance {
        /// Remaining allowance.
        allowance: Amount,
        /// Amount the operation needed.
        amount: Amount,
    },

    /// Minting would overflow the supply or a balance.
    #[error("ERC20: supply overflow minting {amount}")]
    SupplyOverflow {
        /// The amount being minted.
        amount: Amount,
    },

    /// Tokens cannot be sent to the zero address.
    #[error("ERC20: transfer to the zero address")]
    TransferToZero,
}

/// Standard fungible-token storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    total_supply: Amount,
}

impl TokenState {
    /// Empty storage with no supply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage with `supply` minted to `holder`.
    pub fn with_supply(holder: Address, supply: Amount) -> Self {
        let mut state = Self::new();
        state.balances.insert(holder, supply);
        state.total_supply = supply;
        state
    }

    /// Total tokens in existence.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of `owner`.
    pub fn balance_of(&self, owner: Address) -> Amount {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    /// Remaining allowance `owner` granted to `spender`.
    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&owner)
            .and_then(|spenders| spenders.get(&spender))
            .copied()
            .unwrap_or(0)
    }

    /// Sets the allowance `owner` grants `spender`, replacing any previous
    /// value.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) {
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);
    }

    /// Creates `amount` new tokens for `to`.
    pub fn mint(&mut self, to: Address, amount: Amount) -> Result<(), TokenStateError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenStateError::SupplyOverflow { amount })?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenStateError::SupplyOverflow { amount })?;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        Ok(())
    }

    /// Destroys `amount` of `from`'s tokens.
    pub fn burn(&mut self, from: Address, amount: Amount) -> Result<(), TokenStateError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(TokenStateError::InsufficientBalance { balance, amount });
        }
        self.balances.insert(from, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Moves `amount` from `from` to `to`.
    pub fn move_balance(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TokenStateError> {
        if to.is_zero() {
            return Err(TokenStateError::TransferToZero);
        }
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(TokenStateError::InsufficientBalance { balance, amount });
        }
        self.balances.insert(from, balance - amount);
        // Sum of balances equals the supply, so the recipient cannot overflow.
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }

    /// Reduces the allowance `owner` granted `spender` by `amount`.
    pub fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), TokenStateError> {
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return Err(TokenStateError::InsufficientAllowance { allowance, amount });
        }
        self.approve(owner, spender, allowance - amount);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StandardToken
// ---------------------------------------------------------------------------

/// A token that follows the standard interface to the letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardToken {
    /// Human-readable name, e.g. "Test Token".
    pub name: String,
    /// Ticker symbol, e.g. "TST".
    pub symbol: String,
    /// Display precision.
    pub decimals: u8,
}

impl StandardToken {
    /// Token code with the given metadata.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

impl TokenContract for StandardToken {
    fn transfer(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        chain
            .token_state_mut(ctx.this)?
            .move_balance(ctx.caller, to, amount)?;
        Ok(Some(true))
    }

    fn transfer_from(
        &self,
        chain: &mut Chain,
        ctx: CallContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        let state = chain.token_state_mut(ctx.this)?;
        // A failed move after the allowance is spent is undone with the frame.
        state.spend_allowance(from, ctx.caller, amount)?;
        state.move_balance(from, to, amount)?;
        Ok(Some(true))
    }
}

// ---------------------------------------------------------------------------
// TokenClient
// ---------------------------------------------------------------------------

/// Typed handle for calling the token at one address through the chain.
///
/// Every mutating call runs as its own frame via [`Chain::call_token`], so a
/// reverting token never leaves partial writes behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenClient {
    address: Address,
}

impl TokenClient {
    /// Handle for the token at `address`.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// The token's contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// `caller` sends `amount` to `to`.
    pub fn transfer(
        &self,
        chain: &mut Chain,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        chain.call_token(self.address, caller, |code, chain, ctx| {
            code.transfer(chain, ctx, to, amount)
        })
    }

    /// `spender` pulls `amount` from `from` to `to`.
    pub fn transfer_from(
        &self,
        chain: &mut Chain,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> CallOutcome {
        chain.call_token(self.address, spender, |code, chain, ctx| {
            code.transfer_from(chain, ctx, from, to, amount)
        })
    }

    /// `owner` lets `spender` pull up to `amount`.
    pub fn approve(
        &self,
        chain: &mut Chain,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> CallOutcome {
        chain.call_token(self.address, owner, |code, chain, ctx| {
            code.approve(chain, ctx, spender, amount)
        })
    }

    /// Balance of `owner`.
    pub fn balance_of(&self, chain: &Chain, owner: Address) -> Amount {
        chain.token_balance_of(self.address, owner)
    }

    /// Allowance `owner` granted `spender`.
    pub fn allowance(&self, chain: &Chain, owner: Address, spender: Address) -> Amount {
        chain.token_allowance(self.address, owner, spender)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
