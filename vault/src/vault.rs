//! # Cipher Vault Contract
//!
//! [`CipherVault`] is the custodial contract: deposits, internal transfers,
//! and withdrawals of the native currency and of arbitrary fungible tokens,
//! all against one [`Ledger`](crate::ledger::Ledger) stored under the
//! vault's address.
//!
//! The struct itself holds only the vault's identity and configuration. Its
//! storage lives in the [`Chain`], and every operation receives the chain as
//! an explicit `&mut` handle. There is no ambient state to reach around.
//!
//! ## Operation Shape
//!
//! Every mutating operation runs inside one chain frame and follows the same
//! order:
//!
//! ```text
//! 1. CHECK     zero amounts, forbidden destinations
//! 2. EFFECT    ledger debit/credit
//! 3. INTERACT  native payout, token push
//! 4. VERIFY    owed <= held for the touched asset
//! ```
//!
//! Token deposits are the one exception: the delegated pull happens *before*
//! the credit, because crediting on an unconfirmed pull would let a broken
//! token mint phantom balances. Nothing is credited until the token reports
//! success.
//!
//! Any error returned from inside the frame reverts everything the frame
//! did, so a failed payout also undoes its debit.
//!
//! ## Reentrancy
//!
//! A token's `transfer` may call straight back into the vault. Because the
//! debit is already in the ledger when the push starts, a nested withdrawal
//! sees the reduced balance. No lock is involved; ordering alone closes the
//! window.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::address::Address;
use crate::asset::Asset;
use crate::chain::Chain;
use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::ledger::Amount;
use crate::token::{interpret, CallOutcome, TokenCall, TokenClient};

// ---------------------------------------------------------------------------
// Receipts & Reports
// ---------------------------------------------------------------------------

/// Result of a successful internal transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// The asset moved.
    pub asset: Asset,
    /// Debited account.
    pub from: Address,
    /// Credited account.
    pub to: Address,
    /// Amount moved.
    pub amount: Amount,
    /// Sender's entry after the transfer.
    pub from_balance: Amount,
    /// Recipient's entry after the transfer.
    pub to_balance: Amount,
}

/// What the vault owes and holds for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPosition {
    /// The asset.
    pub asset: Asset,
    /// Sum of ledger entries.
    pub owed: Amount,
    /// The vault's external holding.
    pub held: Amount,
}

impl AssetPosition {
    /// Holdings in excess of liabilities; zero on a shortfall.
    pub fn surplus(&self) -> Amount {
        self.held.saturating_sub(self.owed)
    }

    /// Returns `true` if the vault can pay every depositor in full.
    pub fn is_solvent(&self) -> bool {
        self.owed <= self.held
    }
}

/// Per-asset solvency snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvencyReport {
    /// The vault audited.
    pub vault: Address,
    /// One position per asset, native first.
    pub positions: Vec<AssetPosition>,
}

impl SolvencyReport {
    /// Returns `true` if every asset is solvent.
    pub fn is_solvent(&self) -> bool {
        self.positions.iter().all(AssetPosition::is_solvent)
    }

    /// Positions where the vault owes more than it holds.
    pub fn shortfalls(&self) -> Vec<AssetPosition> {
        self.positions
            .iter()
            .filter(|p| !p.is_solvent())
            .copied()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// CipherVault
// ---------------------------------------------------------------------------

/// Handle to a deployed vault. Cheap to clone; holds no balances itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherVault {
    address: Address,
    config: VaultConfig,
}

impl CipherVault {
    pub(crate) fn new(address: Address, config: VaultConfig) -> Self {
        Self { address, config }
    }

    /// The vault's own address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The vault's configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Native-asset handler
    // -----------------------------------------------------------------------

    /// Deposits `value` of native currency attached to the call. Returns the
    /// caller's new entry.
    ///
    /// # Errors
    ///
    /// [`VaultError::DepositAmountZero`] for zero value; a substrate error if
    /// the caller cannot fund `value`.
    pub fn deposit_native(
        &self,
        chain: &mut Chain,
        caller: Address,
        value: Amount,
    ) -> Result<Amount, VaultError> {
        chain.call_with_value(caller, self.address, value, |chain| {
            if value == 0 {
                return Err(VaultError::DepositAmountZero);
            }

            let balance = chain
                .ledger_mut(self.address)?
                .credit(Asset::Native, caller, value)?;
            self.ensure_solvent(chain, Asset::Native)?;

            debug!(vault = %self.address, caller = %caller, amount = %value, balance = %balance, "native deposit");
            Ok(balance)
        })
    }

    /// Withdraws `amount` of native currency to the caller. Returns the
    /// caller's remaining entry.
    ///
    /// # Errors
    ///
    /// [`VaultError::WithdrawAmountZero`], [`VaultError::InsufficientBalance`],
    /// or [`VaultError::NativeTransferFailed`] if the caller refuses the
    /// payout. On every error the ledger is left as it was.
    pub fn withdraw_native(
        &self,
        chain: &mut Chain,
        caller: Address,
        amount: Amount,
    ) -> Result<Amount, VaultError> {
        chain.call(|chain| {
            if amount == 0 {
                return Err(VaultError::WithdrawAmountZero);
            }

            chain
                .ledger_mut(self.address)?
                .debit(Asset::Native, caller, amount)?;

            chain
                .transfer_native(self.address, caller, amount)
                .map_err(|source| {
                    warn!(vault = %self.address, caller = %caller, amount = %amount, error = %source, "native payout failed");
                    VaultError::NativeTransferFailed {
                        to: caller,
                        amount,
                        source,
                    }
                })?;
            self.ensure_solvent(chain, Asset::Native)?;

            let remaining = self.balance_of(chain, Asset::Native, caller);
            debug!(vault = %self.address, caller = %caller, amount = %amount, remaining = %remaining, "native withdrawal");
            Ok(remaining)
        })
    }

    /// Moves `amount` of native balance from the caller to `to`.
    pub fn transfer_native(
        &self,
        chain: &mut Chain,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, VaultError> {
        self.transfer(chain, caller, Asset::Native, to, amount)
    }

    // -----------------------------------------------------------------------
    // Transfer engine
    // -----------------------------------------------------------------------

    /// Moves `amount` of `asset` between two ledger entries. No external
    /// call is made.
    ///
    /// # Errors
    ///
    /// [`VaultError::TransferAmountZero`], [`VaultError::TransferToZeroAddress`],
    /// [`VaultError::TransferToVault`], [`VaultError::InsufficientBalance`],
    /// or [`VaultError::ArithmeticOverflow`] if the recipient's entry would
    /// overflow (the debit is then undone).
    pub fn transfer(
        &self,
        chain: &mut Chain,
        caller: Address,
        asset: Asset,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, VaultError> {
        chain.call(|chain| {
            if amount == 0 {
                return Err(VaultError::TransferAmountZero);
            }
            if to.is_zero() {
                return Err(VaultError::TransferToZeroAddress);
            }
            if to == self.address {
                return Err(VaultError::TransferToVault);
            }

            let ledger = chain.ledger_mut(self.address)?;
            ledger.debit(asset, caller, amount)?;
            let to_balance = ledger.credit(asset, to, amount)?;
            let from_balance = ledger.balance_of(asset, caller);

            debug!(vault = %self.address, asset = %asset, from = %caller, to = %to, amount = %amount, "internal transfer");
            Ok(TransferReceipt {
                asset,
                from: caller,
                to,
                amount,
                from_balance,
                to_balance,
            })
        })
    }

    // -----------------------------------------------------------------------
    // Token-asset handler
    // -----------------------------------------------------------------------

    /// Pulls `amount` of `token` from the caller and credits it. Returns the
    /// caller's new entry.
    ///
    /// The caller must have approved the vault for at least `amount`.
    ///
    /// # Errors
    ///
    /// [`VaultError::DepositAmountZero`], [`VaultError::InsufficientTokenBalance`]
    /// / [`VaultError::InsufficientAllowance`] when the pre-check predicts
    /// failure, [`VaultError::TokenCallFailed`] if the pull does not report
    /// success, [`VaultError::SolvencyViolation`] if the vault received less
    /// than the token claimed.
    pub fn deposit_token(
        &self,
        chain: &mut Chain,
        caller: Address,
        token: Address,
        amount: Amount,
    ) -> Result<Amount, VaultError> {
        chain.call(|chain| {
            if amount == 0 {
                return Err(VaultError::DepositAmountZero);
            }

            let client = TokenClient::new(token);
            if self.config.precheck_token_deposits {
                self.precheck_deposit(chain, client, caller, amount)?;
            }

            let outcome = client.transfer_from(chain, self.address, caller, self.address, amount);
            self.settle(token, TokenCall::TransferFrom, outcome)?;

            let asset = Asset::Token(token);
            chain.ledger_mut(self.address)?.credit(asset, caller, amount)?;
            self.ensure_solvent(chain, asset)?;

            let balance = self.balance_of(chain, asset, caller);
            debug!(vault = %self.address, token = %token, caller = %caller, amount = %amount, balance = %balance, "token deposit");
            Ok(balance)
        })
    }

    /// Debits `amount` of `token` and pushes it to the caller. Returns the
    /// caller's remaining entry.
    ///
    /// # Errors
    ///
    /// [`VaultError::WithdrawAmountZero`], [`VaultError::InsufficientBalance`],
    /// or [`VaultError::TokenCallFailed`] if the push does not report
    /// success, in which case the debit is undone.
    pub fn withdraw_token(
        &self,
        chain: &mut Chain,
        caller: Address,
        token: Address,
        amount: Amount,
    ) -> Result<Amount, VaultError> {
        chain.call(|chain| {
            if amount == 0 {
                return Err(VaultError::WithdrawAmountZero);
            }

            let asset = Asset::Token(token);
            // Debit before the push: a token re-entering from `transfer`
            // must already see the reduced entry.
            chain.ledger_mut(self.address)?.debit(asset, caller, amount)?;

            let outcome = TokenClient::new(token).transfer(chain, self.address, caller, amount);
            self.settle(token, TokenCall::Transfer, outcome)?;
            self.ensure_solvent(chain, asset)?;

            let remaining = self.balance_of(chain, asset, caller);
            debug!(vault = %self.address, token = %token, caller = %caller, amount = %amount, remaining = %remaining, "token withdrawal");
            Ok(remaining)
        })
    }

    /// Moves `amount` of `token` balance from the caller to `to`.
    pub fn transfer_token(
        &self,
        chain: &mut Chain,
        caller: Address,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, VaultError> {
        self.transfer(chain, caller, Asset::Token(token), to, amount)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Ledger entry for `(asset, account)`. Never fails; zero if absent.
    pub fn balance_of(&self, chain: &Chain, asset: Asset, account: Address) -> Amount {
        chain
            .ledger(self.address)
            .map(|ledger| ledger.balance_of(asset, account))
            .unwrap_or(0)
    }

    /// Native ledger entry for `account`.
    pub fn native_balance_of(&self, chain: &Chain, account: Address) -> Amount {
        self.balance_of(chain, Asset::Native, account)
    }

    /// Ledger entry of `token` for `account`.
    pub fn token_balance_of(&self, chain: &Chain, token: Address, account: Address) -> Amount {
        self.balance_of(chain, Asset::Token(token), account)
    }

    /// Sum of all entries for `asset`.
    pub fn owed(&self, chain: &Chain, asset: Asset) -> Amount {
        chain
            .ledger(self.address)
            .map(|ledger| ledger.total_owed(asset))
            .unwrap_or(0)
    }

    /// The vault's external holding of `asset`.
    pub fn held(&self, chain: &Chain, asset: Asset) -> Amount {
        match asset {
            Asset::Native => chain.native_balance(self.address),
            Asset::Token(token) => chain.token_balance_of(token, self.address),
        }
    }

    /// Owed vs. held for the native asset and every asset in the ledger.
    pub fn solvency_report(&self, chain: &Chain) -> SolvencyReport {
        let mut assets = vec![Asset::Native];
        if let Some(ledger) = chain.ledger(self.address) {
            assets.extend(ledger.assets().filter(|a| !a.is_native()));
        }

        let positions = assets
            .into_iter()
            .map(|asset| AssetPosition {
                asset,
                owed: self.owed(chain, asset),
                held: self.held(chain, asset),
            })
            .collect();

        SolvencyReport {
            vault: self.address,
            positions,
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn precheck_deposit(
        &self,
        chain: &Chain,
        client: TokenClient,
        caller: Address,
        amount: Amount,
    ) -> Result<(), VaultError> {
        let available = client.balance_of(chain, caller);
        if available < amount {
            return Err(VaultError::InsufficientTokenBalance {
                token: client.address(),
                available,
                requested: amount,
            });
        }

        let allowance = client.allowance(chain, caller, self.address);
        if allowance < amount {
            return Err(VaultError::InsufficientAllowance {
                token: client.address(),
                allowance,
                requested: amount,
            });
        }
        Ok(())
    }

    fn settle(
        &self,
        token: Address,
        call: TokenCall,
        outcome: CallOutcome,
    ) -> Result<(), VaultError> {
        interpret(outcome, self.config.token_return_policy).map_err(|failure| {
            warn!(vault = %self.address, token = %token, call = %call, failure = %failure, "token call failed");
            VaultError::TokenCallFailed {
                token,
                call,
                failure,
            }
        })
    }

    fn ensure_solvent(&self, chain: &Chain, asset: Asset) -> Result<(), VaultError> {
        if !self.config.check_solvency {
            return Ok(());
        }
        let owed = self.owed(chain, asset);
        let held = self.held(chain, asset);
        if held < owed {
            warn!(vault = %self.address, asset = %asset, owed = %owed, held = %held, "solvency check failed");
            return Err(VaultError::SolvencyViolation { asset, owed, held });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{TokenReturnPolicy, ONE_NATIVE};
    use crate::error::ErrorKind;
    use crate::token::{CallContext, StandardToken, TokenContract, TokenState};

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn setup() -> (Chain, CipherVault) {
        let mut chain = Chain::new();
        chain.fund(alice(), 100 * ONE_NATIVE).unwrap();
        chain.fund(bob(), 100 * ONE_NATIVE).unwrap();
        let vault = chain.deploy_vault(VaultConfig::default());
        (chain, vault)
    }

    fn deploy_token(chain: &mut Chain, vault: &CipherVault) -> TokenClient {
        let code = Arc::new(StandardToken::new("Test Token", "TST", 18));
        let token = TokenClient::new(
            chain.deploy_token(code, TokenState::with_supply(alice(), 1000 * ONE_NATIVE)),
        );
        token
            .approve(chain, alice(), vault.address(), Amount::MAX)
            .unwrap();
        token
    }

    /// Returns whatever outcome it was built with, moving nothing.
    #[derive(Debug)]
    struct FixedOutcomeToken(Option<bool>);

    impl TokenContract for FixedOutcomeToken {
        fn transfer(&self, _: &mut Chain, _: CallContext, _: Address, _: Amount) -> CallOutcome {
            Ok(self.0)
        }

        fn transfer_from(
            &self,
            _: &mut Chain,
            _: CallContext,
            _: Address,
            _: Address,
            _: Amount,
        ) -> CallOutcome {
            Ok(self.0)
        }
    }

    #[test]
    fn native_deposit_credits_and_holds() {
        let (mut chain, vault) = setup();

        let balance = vault.deposit_native(&mut chain, alice(), ONE_NATIVE).unwrap();
        assert_eq!(balance, ONE_NATIVE);
        assert_eq!(vault.native_balance_of(&chain, alice()), ONE_NATIVE);
        assert_eq!(chain.native_balance(vault.address()), ONE_NATIVE);
        assert_eq!(chain.native_balance(alice()), 99 * ONE_NATIVE);
    }

    #[test]
    fn zero_native_deposit_rejected() {
        let (mut chain, vault) = setup();

        let err = vault.deposit_native(&mut chain, alice(), 0).unwrap_err();
        assert_eq!(err, VaultError::DepositAmountZero);
        assert_eq!(err.kind(), ErrorKind::ZeroAmount);
        assert!(chain.ledger(vault.address()).unwrap().is_empty());
    }

    #[test]
    fn unfunded_native_deposit_rejected() {
        let (mut chain, vault) = setup();
        let pauper = Address::from_label("pauper");

        let err = vault.deposit_native(&mut chain, pauper, 1).unwrap_err();
        assert!(matches!(err, VaultError::Chain(_)));
        assert_eq!(vault.native_balance_of(&chain, pauper), 0);
    }

    #[test]
    fn native_withdraw_pays_out() {
        let (mut chain, vault) = setup();
        vault.deposit_native(&mut chain, alice(), ONE_NATIVE).unwrap();

        let remaining = vault
            .withdraw_native(&mut chain, alice(), ONE_NATIVE / 2)
            .unwrap();
        assert_eq!(remaining, ONE_NATIVE / 2);
        assert_eq!(chain.native_balance(vault.address()), ONE_NATIVE / 2);
        assert_eq!(chain.native_balance(alice()), 99 * ONE_NATIVE + ONE_NATIVE / 2);
    }

    #[test]
    fn native_withdraw_to_rejecting_caller_rolls_back() {
        let (mut chain, vault) = setup();
        vault.deposit_native(&mut chain, alice(), ONE_NATIVE).unwrap();
        chain.set_rejects_native(alice(), true);

        let err = vault
            .withdraw_native(&mut chain, alice(), ONE_NATIVE)
            .unwrap_err();
        assert!(matches!(err, VaultError::NativeTransferFailed { .. }));
        assert_eq!(err.kind(), ErrorKind::ExternalCallFailure);
        assert_eq!(vault.native_balance_of(&chain, alice()), ONE_NATIVE);
        assert_eq!(chain.native_balance(vault.address()), ONE_NATIVE);
    }

    #[test]
    fn withdraw_zero_and_overdraw_rejected() {
        let (mut chain, vault) = setup();
        vault.deposit_native(&mut chain, alice(), 10).unwrap();

        assert_eq!(
            vault.withdraw_native(&mut chain, alice(), 0),
            Err(VaultError::WithdrawAmountZero)
        );
        let err = vault.withdraw_native(&mut chain, alice(), 11).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(err.reason(), "Insufficient ether balance");
        assert_eq!(vault.native_balance_of(&chain, alice()), 10);
    }

    #[test]
    fn transfer_moves_entries_only() {
        let (mut chain, vault) = setup();
        vault.deposit_native(&mut chain, alice(), 100).unwrap();

        let receipt = vault.transfer_native(&mut chain, alice(), bob(), 40).unwrap();
        assert_eq!(receipt.from_balance, 60);
        assert_eq!(receipt.to_balance, 40);
        assert_eq!(chain.native_balance(vault.address()), 100);
        assert_eq!(vault.owed(&chain, Asset::Native), 100);
    }

    #[test]
    fn transfer_destination_rules() {
        let (mut chain, vault) = setup();
        vault.deposit_native(&mut chain, alice(), 100).unwrap();

        assert_eq!(
            vault.transfer_native(&mut chain, alice(), bob(), 0),
            Err(VaultError::TransferAmountZero)
        );
        assert_eq!(
            vault.transfer_native(&mut chain, alice(), Address::ZERO, 1),
            Err(VaultError::TransferToZeroAddress)
        );
        assert_eq!(
            vault.transfer_native(&mut chain, alice(), vault.address(), 1),
            Err(VaultError::TransferToVault)
        );
        assert_eq!(vault.native_balance_of(&chain, alice()), 100);
    }

    #[test]
    fn transfer_to_self_is_a_no_op() {
        let (mut chain, vault) = setup();
        vault.deposit_native(&mut chain, alice(), 100).unwrap();

        let receipt = vault.transfer_native(&mut chain, alice(), alice(), 30).unwrap();
        assert_eq!(receipt.from_balance, 100);
        assert_eq!(receipt.to_balance, 100);
    }

    #[test]
    fn token_deposit_transfer_withdraw() {
        let (mut chain, vault) = setup();
        let token = deploy_token(&mut chain, &vault);

        vault
            .deposit_token(&mut chain, alice(), token.address(), ONE_NATIVE)
            .unwrap();
        assert_eq!(token.balance_of(&chain, vault.address()), ONE_NATIVE);

        vault
            .transfer_token(&mut chain, alice(), token.address(), bob(), ONE_NATIVE / 2)
            .unwrap();
        assert_eq!(
            vault.token_balance_of(&chain, token.address(), bob()),
            ONE_NATIVE / 2
        );

        let remaining = vault
            .withdraw_token(&mut chain, bob(), token.address(), ONE_NATIVE / 2)
            .unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(token.balance_of(&chain, bob()), ONE_NATIVE / 2);
        assert_eq!(token.balance_of(&chain, vault.address()), ONE_NATIVE / 2);
        assert!(vault.solvency_report(&chain).is_solvent());
    }

    #[test]
    fn token_deposit_prechecks() {
        let (mut chain, vault) = setup();
        let token = deploy_token(&mut chain, &vault);

        let err = vault
            .deposit_token(&mut chain, alice(), token.address(), 1001 * ONE_NATIVE)
            .unwrap_err();
        assert!(matches!(err, VaultError::InsufficientTokenBalance { .. }));
        assert_eq!(err.reason(), "Insufficient token balance");

        token.transfer(&mut chain, alice(), bob(), 10).unwrap();
        let err = vault
            .deposit_token(&mut chain, bob(), token.address(), 10)
            .unwrap_err();
        assert!(matches!(err, VaultError::InsufficientAllowance { allowance: 0, .. }));
    }

    #[test]
    fn token_deposit_without_precheck_fails_on_pull() {
        let mut chain = Chain::new();
        let config = VaultConfig {
            precheck_token_deposits: false,
            ..VaultConfig::default()
        };
        let vault = chain.deploy_vault(config);
        let code = Arc::new(StandardToken::new("Test Token", "TST", 18));
        let token = chain.deploy_token(code, TokenState::with_supply(alice(), 5));

        let err = vault.deposit_token(&mut chain, alice(), token, 5).unwrap_err();
        assert!(matches!(
            err,
            VaultError::TokenCallFailed {
                call: TokenCall::TransferFrom,
                ..
            }
        ));
        assert_eq!(vault.token_balance_of(&chain, token, alice()), 0);
    }

    #[test]
    fn deposit_of_non_contract_token_fails() {
        let (mut chain, vault) = setup();
        let config = VaultConfig {
            precheck_token_deposits: false,
            ..VaultConfig::default()
        };
        let unchecked = chain.deploy_vault(config);
        let nowhere = Address::from_label("not-a-token");

        assert!(vault.deposit_token(&mut chain, alice(), nowhere, 1).is_err());
        let err = unchecked
            .deposit_token(&mut chain, alice(), nowhere, 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalCallFailure);
    }

    #[test]
    fn missing_return_value_policy() {
        let mut chain = Chain::new();
        let token = chain.deploy_token(Arc::new(FixedOutcomeToken(None)), TokenState::new());

        let strict = chain.deploy_vault(VaultConfig {
            precheck_token_deposits: false,
            check_solvency: false,
            ..VaultConfig::default()
        });
        let err = strict.deposit_token(&mut chain, alice(), token, 1).unwrap_err();
        assert!(matches!(
            err,
            VaultError::TokenCallFailed {
                failure: crate::token::CallFailure::NoReturnValue,
                ..
            }
        ));

        let lenient = chain.deploy_vault(VaultConfig {
            token_return_policy: TokenReturnPolicy::AllowEmpty,
            precheck_token_deposits: false,
            check_solvency: false,
        });
        assert_eq!(lenient.deposit_token(&mut chain, alice(), token, 1), Ok(1));
    }

    #[test]
    fn solvency_check_catches_phantom_credit() {
        let mut chain = Chain::new();
        // Claims success without moving anything.
        let token = chain.deploy_token(
            Arc::new(FixedOutcomeToken(Some(true))),
            TokenState::new(),
        );
        let vault = chain.deploy_vault(VaultConfig {
            precheck_token_deposits: false,
            ..VaultConfig::default()
        });

        let err = vault.deposit_token(&mut chain, alice(), token, 7).unwrap_err();
        assert_eq!(
            err,
            VaultError::SolvencyViolation {
                asset: Asset::Token(token),
                owed: 7,
                held: 0,
            }
        );
        assert_eq!(vault.token_balance_of(&chain, token, alice()), 0);
    }

    #[test]
    fn token_deposit_overflowing_entry_rejected() {
        let mut chain = Chain::new();
        let token = chain.deploy_token(
            Arc::new(FixedOutcomeToken(Some(true))),
            TokenState::new(),
        );
        let vault = chain.deploy_vault(VaultConfig {
            precheck_token_deposits: false,
            check_solvency: false,
            ..VaultConfig::default()
        });

        vault
            .deposit_token(&mut chain, alice(), token, Amount::MAX)
            .unwrap();
        let err = vault.deposit_token(&mut chain, alice(), token, 1).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ArithmeticOverflow);
        assert_eq!(
            err,
            VaultError::ArithmeticOverflow {
                asset: Asset::Token(token),
                account: alice(),
                amount: 1,
            }
        );
        assert_eq!(vault.token_balance_of(&chain, token, alice()), Amount::MAX);
        assert_eq!(vault.owed(&chain, Asset::Token(token)), Amount::MAX);
    }

    #[test]
    fn solvency_report_lists_every_asset() {
        let (mut chain, vault) = setup();
        let token = deploy_token(&mut chain, &vault);
        vault.deposit_native(&mut chain, alice(), 5).unwrap();
        vault.deposit_token(&mut chain, alice(), token.address(), 9).unwrap();

        let report = vault.solvency_report(&chain);
        assert_eq!(report.positions.len(), 2);
        assert_eq!(report.positions[0].asset, Asset::Native);
        assert_eq!(report.positions[1].owed, 9);
        assert!(report.shortfalls().is_empty());
    }
}
