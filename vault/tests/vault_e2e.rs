//! End-to-end tests for the Cipher Vault.
//!
//! These replay the full account lifecycle against a fresh chain: genesis
//! funding, token deployment, approvals, native and token deposits, internal
//! transfers, and withdrawals, followed by the rejection paths a caller can
//! hit on each entry point.
//!
//! Amounts are written the way a user would write them and converted with
//! `parse_units`.

use std::sync::Arc;

use cipher_vault::config::{DEFAULT_GENESIS_BALANCE, DEFAULT_TOKEN_SUPPLY, NATIVE_DECIMALS};
use cipher_vault::units::parse_units;
use cipher_vault::{
    Address, Amount, Asset, Chain, CipherVault, ErrorKind, StandardToken, TokenClient, TokenState,
    VaultConfig, VaultError,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

struct World {
    chain: Chain,
    vault: CipherVault,
    token: TokenClient,
    accounts: Vec<Address>,
}

fn ether(s: &str) -> Amount {
    parse_units(s, NATIVE_DECIMALS).unwrap()
}

/// Ten funded accounts, one vault, and one standard token whose entire
/// supply belongs to the first account.
fn setup() -> World {
    let mut chain = Chain::new();
    let accounts: Vec<Address> = (0..10)
        .map(|i| Address::from_label(&format!("account-{i}")))
        .collect();
    for account in &accounts {
        chain.fund(*account, DEFAULT_GENESIS_BALANCE).unwrap();
    }

    let vault = chain.deploy_vault(VaultConfig::default());
    let code = Arc::new(StandardToken::new("ERC20Test", "TST", 18));
    let token = TokenClient::new(
        chain.deploy_token(code, TokenState::with_supply(accounts[0], DEFAULT_TOKEN_SUPPLY)),
    );

    World {
        chain,
        vault,
        token,
        accounts,
    }
}

/// `setup()` plus one ether and one token deposited by the first account.
fn setup_with_deposits() -> World {
    let mut w = setup();
    let a0 = w.accounts[0];
    w.vault.deposit_native(&mut w.chain, a0, ether("1")).unwrap();
    w.token
        .approve(&mut w.chain, a0, w.vault.address(), ether("1"))
        .unwrap();
    w.vault
        .deposit_token(&mut w.chain, a0, w.token.address(), ether("1"))
        .unwrap();
    w
}

// ---------------------------------------------------------------------------
// 1. Full Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn full_native_and_token_lifecycle() {
    let mut w = setup();
    let (a0, a1) = (w.accounts[0], w.accounts[1]);
    let vault = w.vault.address();
    let token = w.token.address();

    assert!(!vault.is_zero());

    // Native deposit.
    w.vault.deposit_native(&mut w.chain, a0, ether("1")).unwrap();
    assert_eq!(w.chain.native_balance(vault), ether("1"));
    assert_eq!(w.vault.native_balance_of(&w.chain, a0), ether("1"));

    // Token deposit.
    w.token.approve(&mut w.chain, a0, vault, ether("1")).unwrap();
    w.vault.deposit_token(&mut w.chain, a0, token, ether("1")).unwrap();
    assert_eq!(w.token.balance_of(&w.chain, vault), ether("1"));
    assert_eq!(w.vault.token_balance_of(&w.chain, token, a0), ether("1"));

    // Native transfer inside the vault.
    w.vault
        .transfer_native(&mut w.chain, a0, a1, ether("0.5"))
        .unwrap();
    assert_eq!(w.vault.native_balance_of(&w.chain, a0), ether("0.5"));
    assert_eq!(w.vault.native_balance_of(&w.chain, a1), ether("0.5"));

    // Token transfer inside the vault; the external holding is untouched.
    w.vault
        .transfer_token(&mut w.chain, a0, token, a1, ether("0.5"))
        .unwrap();
    assert_eq!(w.token.balance_of(&w.chain, vault), ether("1"));
    assert_eq!(w.vault.token_balance_of(&w.chain, token, a0), ether("0.5"));
    assert_eq!(w.vault.token_balance_of(&w.chain, token, a1), ether("0.5"));

    // Native withdrawal.
    w.vault
        .withdraw_native(&mut w.chain, a0, ether("0.5"))
        .unwrap();
    assert_eq!(w.vault.native_balance_of(&w.chain, a0), 0);
    assert_eq!(w.chain.native_balance(vault), ether("0.5"));
    assert_eq!(
        w.chain.native_balance(a0),
        ether("9999") + ether("0.5")
    );

    // Token withdrawal.
    w.vault
        .withdraw_token(&mut w.chain, a0, token, ether("0.5"))
        .unwrap();
    assert_eq!(w.vault.token_balance_of(&w.chain, token, a0), 0);
    assert_eq!(w.token.balance_of(&w.chain, vault), ether("0.5"));
    assert_eq!(
        w.token.balance_of(&w.chain, a0),
        ether("999999") + ether("0.5")
    );

    assert!(w.vault.solvency_report(&w.chain).is_solvent());
}

// ---------------------------------------------------------------------------
// 2. Unhappy Paths
// ---------------------------------------------------------------------------

#[test]
fn zero_deposits_rejected() {
    let mut w = setup();
    let a0 = w.accounts[0];
    let token = w.token.address();

    let err = w.vault.deposit_native(&mut w.chain, a0, 0).unwrap_err();
    assert_eq!(err.reason(), "Deposit amount must be greater than zero");

    let err = w.vault.deposit_token(&mut w.chain, a0, token, 0).unwrap_err();
    assert_eq!(err.reason(), "Deposit amount must be greater than zero");

    assert_eq!(w.chain.native_balance(a0), DEFAULT_GENESIS_BALANCE);
}

#[test]
fn token_deposit_beyond_holding_rejected() {
    let mut w = setup();
    let a1 = w.accounts[1];
    let (vault, token) = (w.vault.address(), w.token.address());

    w.token.transfer(&mut w.chain, w.accounts[0], a1, ether("10")).unwrap();
    w.token.approve(&mut w.chain, a1, vault, Amount::MAX).unwrap();

    let err = w
        .vault
        .deposit_token(&mut w.chain, a1, token, ether("1000"))
        .unwrap_err();
    assert_eq!(err.reason(), "Insufficient token balance");
    assert_eq!(w.token.balance_of(&w.chain, a1), ether("10"));
    assert_eq!(w.token.balance_of(&w.chain, vault), 0);
}

#[test]
fn token_deposit_beyond_allowance_rejected() {
    let mut w = setup_with_deposits();
    let a0 = w.accounts[0];
    let token = w.token.address();

    // The earlier approval was fully spent by the first deposit.
    let err = w
        .vault
        .deposit_token(&mut w.chain, a0, token, ether("1000"))
        .unwrap_err();
    assert!(matches!(err, VaultError::InsufficientAllowance { allowance: 0, .. }));
    assert_eq!(w.vault.token_balance_of(&w.chain, token, a0), ether("1"));
}

// ---------------------------------------------------------------------------
// 3. Malicious Paths
// ---------------------------------------------------------------------------

#[test]
fn zero_transfers_rejected() {
    let mut w = setup_with_deposits();
    let (a0, a1) = (w.accounts[0], w.accounts[1]);
    let token = w.token.address();

    let err = w.vault.transfer_native(&mut w.chain, a0, a1, 0).unwrap_err();
    assert_eq!(err.reason(), "Transfer amount must be greater than zero");

    let err = w
        .vault
        .transfer_token(&mut w.chain, a0, token, a1, 0)
        .unwrap_err();
    assert_eq!(err.reason(), "Transfer amount must be greater than zero");
}

#[test]
fn transfers_to_zero_address_rejected() {
    let mut w = setup_with_deposits();
    let a0 = w.accounts[0];
    let token = w.token.address();

    let err = w
        .vault
        .transfer_native(&mut w.chain, a0, Address::ZERO, ether("1"))
        .unwrap_err();
    assert_eq!(err.reason(), "Cannot transfer to the zero address");

    let err = w
        .vault
        .transfer_token(&mut w.chain, a0, token, Address::ZERO, ether("1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDestination);
}

#[test]
fn transfers_to_vault_rejected() {
    let mut w = setup_with_deposits();
    let a0 = w.accounts[0];
    let (vault, token) = (w.vault.address(), w.token.address());

    let err = w
        .vault
        .transfer_native(&mut w.chain, a0, vault, ether("1"))
        .unwrap_err();
    assert_eq!(err.reason(), "Cannot transfer to the vault address");

    let err = w
        .vault
        .transfer_token(&mut w.chain, a0, token, vault, ether("1"))
        .unwrap_err();
    assert_eq!(err, VaultError::TransferToVault);
}

#[test]
fn transfers_beyond_entry_rejected() {
    let mut w = setup_with_deposits();
    let (a0, a1) = (w.accounts[0], w.accounts[1]);
    let token = w.token.address();

    let err = w
        .vault
        .transfer_native(&mut w.chain, a0, a1, ether("10000"))
        .unwrap_err();
    assert_eq!(err.reason(), "Insufficient ether balance");

    let err = w
        .vault
        .transfer_token(&mut w.chain, a0, token, a1, ether("10000"))
        .unwrap_err();
    assert_eq!(err.reason(), "Insufficient token balance");

    assert_eq!(w.vault.native_balance_of(&w.chain, a0), ether("1"));
    assert_eq!(w.vault.token_balance_of(&w.chain, token, a0), ether("1"));
    assert_eq!(w.vault.native_balance_of(&w.chain, a1), 0);
}

#[test]
fn overdraw_leaves_everything_unchanged() {
    let mut w = setup_with_deposits();
    let a0 = w.accounts[0];
    let (vault, token) = (w.vault.address(), w.token.address());
    let native_before = w.chain.native_balance(a0);

    let err = w
        .vault
        .withdraw_native(&mut w.chain, a0, ether("2"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert_eq!(w.chain.native_balance(a0), native_before);
    assert_eq!(w.chain.native_balance(vault), ether("1"));

    let err = w
        .vault
        .withdraw_token(&mut w.chain, a0, token, ether("2"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert_eq!(w.token.balance_of(&w.chain, vault), ether("1"));
    assert_eq!(w.vault.token_balance_of(&w.chain, token, a0), ether("1"));
}

#[test]
fn plain_send_to_vault_refused() {
    let mut w = setup();
    let a0 = w.accounts[0];
    let vault = w.vault.address();

    assert!(w.chain.send_native(a0, vault, ether("1")).is_err());
    assert_eq!(w.chain.native_balance(vault), 0);
}

// ---------------------------------------------------------------------------
// 4. Accounting
// ---------------------------------------------------------------------------

#[test]
fn owed_tracks_held_across_many_accounts() {
    let mut w = setup();
    let token = w.token.address();
    let vault = w.vault.address();

    for (i, account) in w.accounts.clone().into_iter().enumerate() {
        let amount = ether(&format!("{}", i + 1));
        w.vault.deposit_native(&mut w.chain, account, amount).unwrap();
        w.token
            .transfer(&mut w.chain, w.accounts[0], account, amount)
            .unwrap();
        w.token.approve(&mut w.chain, account, vault, amount).unwrap();
        w.vault
            .deposit_token(&mut w.chain, account, token, amount)
            .unwrap();
    }

    // Sum of 1..=10.
    assert_eq!(w.vault.owed(&w.chain, Asset::Native), ether("55"));
    assert_eq!(w.vault.held(&w.chain, Asset::Token(token)), ether("55"));

    for account in w.accounts.clone() {
        let half = w.vault.native_balance_of(&w.chain, account) / 2;
        w.vault.withdraw_native(&mut w.chain, account, half).unwrap();
    }

    let report = w.vault.solvency_report(&w.chain);
    assert!(report.is_solvent());
    for position in &report.positions {
        assert_eq!(position.owed, position.held);
    }
}
