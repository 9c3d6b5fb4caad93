//! # In-Memory Execution Substrate
//!
//! The vault is a contract: it does not own its storage, does not move
//! native value itself, and relies on its host to roll back a failed call.
//! [`Chain`] is that host, reduced to exactly what the vault and the tokens
//! it talks to need.
//!
//! ## World State vs. Code
//!
//! ```text
//! WorldState   native balances, token storage, vault ledgers,
//!              addresses that refuse plain native transfers
//! code         token contract objects, keyed by address
//! ```
//!
//! Code lives outside the world state and is handed out as an `Arc`. A token
//! can therefore run while it mutates the world, including calling back into
//! the vault that called it. That callback is the reentrancy hazard the vault
//! defends against, and the substrate makes it expressible rather than
//! impossible.
//!
//! ## Frames
//!
//! [`Chain::call`] runs a closure as one call frame. The world state is
//! snapshotted on entry and restored if the frame returns `Err`. Frames nest,
//! so a failed inner call reverts only its own writes unless the caller
//! propagates the error, in which case the caller's frame reverts as well.
//! Depth is capped at [`MAX_CALL_DEPTH`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::address::Address;
use crate::config::{VaultConfig, MAX_CALL_DEPTH};
use crate::ledger::{Amount, Ledger};
use crate::token::{CallContext, CallOutcome, Revert, TokenContract, TokenState};
use crate::vault::CipherVault;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the substrate itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The sender does not hold enough native currency.
    #[error("insufficient funds: {account} holds {available}, needs {requested}")]
    InsufficientFunds {
        /// The account being charged.
        account: Address,
        /// Its native balance.
        available: Amount,
        /// The amount it tried to send.
        requested: Amount,
    },

    /// The recipient does not accept plain native transfers.
    #[error("recipient {0} rejected native transfer")]
    RecipientRejected(Address),

    /// A frame was opened beyond the maximum call depth.
    #[error("call depth exceeded (limit {limit})")]
    CallDepthExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// No contract is deployed at the address.
    #[error("no contract at {0}")]
    UnknownContract(Address),

    /// Crediting native currency would overflow the recipient's balance.
    #[error("native balance overflow for {0}")]
    BalanceOverflow(Address),
}

// ---------------------------------------------------------------------------
// World State
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
struct WorldState {
    native: BTreeMap<Address, Amount>,
    tokens: BTreeMap<Address, TokenState>,
    ledgers: BTreeMap<Address, Ledger>,
    rejects_native: BTreeSet<Address>,
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Deterministic single-threaded host for the vault and its tokens.
pub struct Chain {
    state: WorldState,
    code: HashMap<Address, Arc<dyn TokenContract>>,
    deployer: Address,
    deploy_nonce: u64,
    depth: usize,
    max_depth: usize,
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("accounts", &self.state.native.len())
            .field("tokens", &self.code.len())
            .field("vaults", &self.state.ledgers.len())
            .field("depth", &self.depth)
            .finish()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// Creates an empty chain with the default call depth limit.
    pub fn new() -> Self {
        Self::with_max_depth(MAX_CALL_DEPTH)
    }

    /// Creates an empty chain with a custom call depth limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            state: WorldState::default(),
            code: HashMap::new(),
            deployer: Address::from_label("deployer"),
            deploy_nonce: 0,
            depth: 0,
            max_depth,
        }
    }

    /// Current frame depth. Zero outside any call.
    pub fn depth(&self) -> usize {
        self.depth
    }

    // -----------------------------------------------------------------------
    // Native currency
    // -----------------------------------------------------------------------

    /// Mints native currency to `account` at genesis. Returns the new
    /// balance.
    pub fn fund(&mut self, account: Address, amount: Amount) -> Result<Amount, ChainError> {
        let balance = self.state.native.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(ChainError::BalanceOverflow(account))?;
        Ok(*balance)
    }

    /// Native balance of `account`.
    pub fn native_balance(&self, account: Address) -> Amount {
        self.state.native.get(&account).copied().unwrap_or(0)
    }

    /// Marks `account` as refusing (or accepting) plain native transfers,
    /// the way a contract without a payable fallback behaves.
    pub fn set_rejects_native(&mut self, account: Address, rejects: bool) {
        if rejects {
            self.state.rejects_native.insert(account);
        } else {
            self.state.rejects_native.remove(&account);
        }
    }

    /// Returns `true` if plain native transfers to `account` fail.
    pub fn rejects_native(&self, account: Address) -> bool {
        self.state.rejects_native.contains(&account)
    }

    /// Plain native transfer from the current frame. Fails if the recipient
    /// refuses native value.
    pub fn transfer_native(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        if self.rejects_native(to) {
            return Err(ChainError::RecipientRejected(to));
        }
        self.move_native(from, to, amount)
    }

    /// Top-level plain native transfer, executed as its own frame.
    pub fn send_native(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        self.call(|chain| chain.transfer_native(from, to, amount))
    }

    fn move_native(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), ChainError> {
        let available = self.native_balance(from);
        if available < amount {
            return Err(ChainError::InsufficientFunds {
                account: from,
                available,
                requested: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let credited = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or(ChainError::BalanceOverflow(to))?;
        self.state.native.insert(from, available - amount);
        self.state.native.insert(to, credited);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Frames
    // -----------------------------------------------------------------------

    /// Runs `f` as one call frame. World state written inside the frame is
    /// discarded if `f` returns `Err`.
    pub fn call<T, E>(&mut self, f: impl FnOnce(&mut Chain) -> Result<T, E>) -> Result<T, E>
    where
        E: From<ChainError>,
    {
        if self.depth >= self.max_depth {
            return Err(ChainError::CallDepthExceeded {
                limit: self.max_depth,
            }
            .into());
        }

        let snapshot = self.state.clone();
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        if result.is_err() {
            trace!(depth = self.depth, "frame reverted");
            self.state = snapshot;
        }
        result
    }

    /// Runs `f` as a frame that carries `value` of native currency from
    /// `from` to `to`. The value moves first, so `f` observes it, and it
    /// moves back if the frame fails. Payable entry points accept value even
    /// from addresses that refuse plain transfers.
    pub fn call_with_value<T, E>(
        &mut self,
        from: Address,
        to: Address,
        value: Amount,
        f: impl FnOnce(&mut Chain) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<ChainError>,
    {
        self.call(|chain| {
            chain.move_native(from, to, value)?;
            f(chain)
        })
    }

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    /// Deploys token `code` with initial storage `state` and returns its
    /// address.
    pub fn deploy_token(&mut self, code: Arc<dyn TokenContract>, state: TokenState) -> Address {
        let address = self.next_contract_address();
        debug!(token = %address, code = ?code, "token deployed");
        self.code.insert(address, code);
        self.state.tokens.insert(address, state);
        address
    }

    /// Returns `true` if a token contract lives at `address`.
    pub fn is_token(&self, address: Address) -> bool {
        self.code.contains_key(&address)
    }

    /// Token storage, for the token's own code and for inspection.
    pub fn token_state(&self, token: Address) -> Option<&TokenState> {
        self.state.tokens.get(&token)
    }

    /// Mutable token storage. Only token code should write here.
    pub fn token_state_mut(&mut self, token: Address) -> Result<&mut TokenState, ChainError> {
        self.state
            .tokens
            .get_mut(&token)
            .ok_or(ChainError::UnknownContract(token))
    }

    /// Invokes token code at `token` on behalf of `caller`, as one frame.
    ///
    /// A call to an address with no code reverts. A call past the depth
    /// limit reverts with the depth error as its reason.
    pub fn call_token(
        &mut self,
        token: Address,
        caller: Address,
        f: impl FnOnce(&dyn TokenContract, &mut Chain, CallContext) -> CallOutcome,
    ) -> CallOutcome {
        let code = match self.code.get(&token) {
            Some(code) => Arc::clone(code),
            None => return Err(Revert::from(ChainError::UnknownContract(token))),
        };
        let ctx = CallContext {
            this: token,
            caller,
        };
        self.call(|chain| f(code.as_ref(), chain, ctx))
    }

    /// Read-only token balance query. Zero for unknown tokens.
    pub fn token_balance_of(&self, token: Address, owner: Address) -> Amount {
        self.code
            .get(&token)
            .map(|code| code.balance_of(self, token, owner))
            .unwrap_or(0)
    }

    /// Read-only token allowance query. Zero for unknown tokens.
    pub fn token_allowance(&self, token: Address, owner: Address, spender: Address) -> Amount {
        self.code
            .get(&token)
            .map(|code| code.allowance(self, token, owner, spender))
            .unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Vaults
    // -----------------------------------------------------------------------

    /// Deploys a vault with an empty ledger. The vault refuses plain native
    /// transfers: value enters only through its deposit entry point.
    pub fn deploy_vault(&mut self, config: VaultConfig) -> CipherVault {
        let address = self.next_contract_address();
        self.state.ledgers.insert(address, Ledger::new());
        self.state.rejects_native.insert(address);
        info!(vault = %address, policy = ?config.token_return_policy, "vault deployed");
        CipherVault::new(address, config)
    }

    /// The ledger stored for the vault at `vault`.
    pub fn ledger(&self, vault: Address) -> Option<&Ledger> {
        self.state.ledgers.get(&vault)
    }

    pub(crate) fn ledger_mut(&mut self, vault: Address) -> Result<&mut Ledger, ChainError> {
        self.state
            .ledgers
            .get_mut(&vault)
            .ok_or(ChainError::UnknownContract(vault))
    }

    fn next_contract_address(&mut self) -> Address {
        let address = Address::derive_contract(&self.deployer, self.deploy_nonce);
        self.deploy_nonce += 1;
        address
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
