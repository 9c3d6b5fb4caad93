//! # Ledger
//!
//! The ledger is the vault's single source of truth: a mapping from
//! `(asset, account)` to the amount that account may withdraw or transfer.
//! Absent entries read as zero; an entry that is debited to zero is pruned,
//! which is indistinguishable from never having existed.
//!
//! Alongside the entries the ledger keeps a running total per asset. The
//! total is what the solvency check compares against the vault's external
//! holdings, so it is maintained in lockstep with every credit and debit
//! rather than recomputed.
//!
//! The mutating primitives are `pub(crate)`. Nothing outside the vault's own
//! handlers can move a balance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::asset::Asset;

/// An amount in an asset's smallest unit.
pub type Amount = u128;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the ledger primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Attempted to debit more than the entry holds.
    #[error(
        "insufficient balance: {account} holds {available} of {asset}, requested {requested}"
    )]
    InsufficientBalance {
        /// The asset being debited.
        asset: Asset,
        /// The account being debited.
        account: Address,
        /// The current entry.
        available: Amount,
        /// The requested debit.
        requested: Amount,
    },

    /// A credit would exceed the representable range, either for the entry
    /// or for the asset's running total.
    #[error("ledger overflow: crediting {credit} of {asset} to {account} (current {current})")]
    Overflow {
        /// The asset being credited.
        asset: Asset,
        /// The account being credited.
        account: Address,
        /// The entry before the failed credit.
        current: Amount,
        /// The amount that caused the overflow.
        credit: Amount,
    },
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Per-asset, per-account balances held by one vault.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    entries: BTreeMap<Asset, BTreeMap<Address, Amount>>,
    totals: BTreeMap<Asset, Amount>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to an entry and returns the new entry.
    ///
    /// Both the entry and the asset total are checked before either is
    /// written, so a failed credit leaves the ledger untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if either sum exceeds `Amount::MAX`.
    pub(crate) fn credit(
        &mut self,
        asset: Asset,
        account: Address,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let current = self.balance_of(asset, account);
        let overflow = || LedgerError::Overflow {
            asset,
            account,
            current,
            credit: amount,
        };

        let new_entry = current.checked_add(amount).ok_or_else(overflow)?;
        let new_total = self
            .total_owed(asset)
            .checked_add(amount)
            .ok_or_else(overflow)?;

        self.entries
            .entry(asset)
            .or_default()
            .insert(account, new_entry);
        self.totals.insert(asset, new_total);

        Ok(new_entry)
    }

    /// Subtracts `amount` from an entry and returns what remains.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if the entry is smaller
    /// than `amount`. The entry is left unchanged.
    pub(crate) fn debit(
        &mut self,
        asset: Asset,
        account: Address,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let available = self.balance_of(asset, account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset,
                account,
                available,
                requested: amount,
            });
        }

        let remaining = available - amount;
        // The total is at least every entry it sums.
        let total = self.total_owed(asset) - amount;

        if let Some(accounts) = self.entries.get_mut(&asset) {
            if remaining == 0 {
                accounts.remove(&account);
            } else {
                accounts.insert(account, remaining);
            }
            if accounts.is_empty() {
                self.entries.remove(&asset);
            }
        }
        if total == 0 {
            self.totals.remove(&asset);
        } else {
            self.totals.insert(asset, total);
        }

        Ok(remaining)
    }

    /// The entry for `(asset, account)`, zero if absent.
    pub fn balance_of(&self, asset: Asset, account: Address) -> Amount {
        self.entries
            .get(&asset)
            .and_then(|accounts| accounts.get(&account))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all entries for `asset`: what the vault owes its depositors.
    pub fn total_owed(&self, asset: Asset) -> Amount {
        self.totals.get(&asset).copied().unwrap_or(0)
    }

    /// Every asset with at least one non-zero entry.
    pub fn assets(&self) -> impl Iterator<Item = Asset> + '_ {
        self.entries.keys().copied()
    }

    /// Non-zero entries for `asset`, ordered by account.
    pub fn accounts(&self, asset: Asset) -> Vec<(Address, Amount)> {
        self.entries
            .get(&asset)
            .map(|accounts| accounts.iter().map(|(a, v)| (*a, *v)).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if no entry is non-zero.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn token() -> Asset {
        Asset::Token(Address::from_label("token"))
    }

    #[test]
    fn credit_creates_new_entry() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.credit(Asset::Native, alice(), 1000), Ok(1000));
        assert_eq!(ledger.balance_of(Asset::Native, alice()), 1000);
        assert_eq!(ledger.total_owed(Asset::Native), 1000);
    }

    #[test]
    fn credit_accumulates() {
        let mut ledger = Ledger::new();
        ledger.credit(Asset::Native, alice(), 500).unwrap();
        ledger.credit(Asset::Native, alice(), 300).unwrap();
        ledger.credit(Asset::Native, bob(), 200).unwrap();

        assert_eq!(ledger.balance_of(Asset::Native, alice()), 800);
        assert_eq!(ledger.total_owed(Asset::Native), 1000);
    }

    #[test]
    fn credit_overflow_rejected_without_mutation() {
        let mut ledger = Ledger::new();
        ledger.credit(Asset::Native, alice(), Amount::MAX).unwrap();
        let before = ledger.clone();

        let result = ledger.credit(Asset::Native, alice(), 1);
        assert!(matches!(result, Err(LedgerError::Overflow { .. })));
        assert_eq!(ledger, before);
    }

    #[test]
    fn total_overflow_rejected_even_when_entry_fits() {
        let mut ledger = Ledger::new();
        ledger.credit(Asset::Native, alice(), Amount::MAX).unwrap();

        // Bob's entry would fit, but the asset total cannot.
        let result = ledger.credit(Asset::Native, bob(), 1);
        assert!(matches!(result, Err(LedgerError::Overflow { .. })));
        assert_eq!(ledger.balance_of(Asset::Native, bob()), 0);
    }

    #[test]
    fn debit_reduces_balance_and_total() {
        let mut ledger = Ledger::new();
        ledger.credit(token(), alice(), 1000).unwrap();

        assert_eq!(ledger.debit(token(), alice(), 400), Ok(600));
        assert_eq!(ledger.balance_of(token(), alice()), 600);
        assert_eq!(ledger.total_owed(token()), 600);
    }

    #[test]
    fn debit_to_zero_prunes_entry() {
        let mut ledger = Ledger::new();
        ledger.credit(token(), alice(), 500).unwrap();

        assert_eq!(ledger.debit(token(), alice(), 500), Ok(0));
        assert!(ledger.is_empty());
        assert_eq!(ledger.total_owed(token()), 0);
        assert_eq!(ledger.assets().count(), 0);
    }

    #[test]
    fn debit_insufficient_balance_leaves_entry() {
        let mut ledger = Ledger::new();
        ledger.credit(Asset::Native, alice(), 100).unwrap();

        let result = ledger.debit(Asset::Native, alice(), 200);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                asset: Asset::Native,
                account: alice(),
                available: 100,
                requested: 200,
            })
        );
        assert_eq!(ledger.balance_of(Asset::Native, alice()), 100);
    }

    #[test]
    fn debit_absent_entry_is_insufficient() {
        let mut ledger = Ledger::new();
        let result = ledger.debit(token(), alice(), 1);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { available: 0, .. })
        ));
    }

    #[test]
    fn assets_are_isolated() {
        let mut ledger = Ledger::new();
        ledger.credit(Asset::Native, alice(), 5000).unwrap();
        ledger.credit(token(), alice(), 2500).unwrap();

        assert!(ledger.debit(token(), alice(), 3000).is_err());
        assert_eq!(ledger.balance_of(Asset::Native, alice()), 5000);
        assert_eq!(ledger.total_owed(token()), 2500);
    }

    #[test]
    fn accounts_lists_non_zero_entries() {
        let mut ledger = Ledger::new();
        ledger.credit(token(), alice(), 10).unwrap();
        ledger.credit(token(), bob(), 20).unwrap();
        ledger.debit(token(), alice(), 10).unwrap();

        assert_eq!(ledger.accounts(token()), vec![(bob(), 20)]);
        assert!(ledger.accounts(Asset::Native).is_empty());
    }

    #[test]
    fn ledger_serialization_roundtrip() {
        let mut ledger = Ledger::new();
        ledger.credit(Asset::Native, alice(), 42).unwrap();
        ledger.credit(token(), bob(), 7).unwrap();

        let json = serde_json::to_string(&ledger).expect("serialize");
        let recovered: Ledger = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered, ledger);
    }
}
