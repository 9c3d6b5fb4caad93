//! # Scenario Runner
//!
//! A scenario is a JSON document describing a world and a script:
//!
//! ```text
//! accounts  label -> genesis native balance
//! tokens    name, kind (standard, no_return, false_return, silent_revert,
//!           fee_on_transfer, reentrant), supply, holder, decimals
//! steps     deposit | approve | transfer | withdraw | send | arm
//!           | expect_balance | expect_holding
//! ```
//!
//! Accounts are referred to by label. `vault` and `zero` are reserved for
//! the vault's address and the zero address, and a `0x` hex string is taken
//! literally. Assets are `native` or a token name. Amounts are decimal
//! strings in the asset's own units (`"0.5"`), or `"max"`.
//!
//! Each mutating step may carry `expect`: `"ok"` (the default) or an error
//! kind such as `"insufficient_balance"`. A step passes when its outcome
//! matches. The run passes when every step passes and the vault ends
//! solvent.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use cipher_vault::config::NATIVE_DECIMALS;
use cipher_vault::token::interpret;
use cipher_vault::units::{format_units, parse_units};
use cipher_vault::{
    Address, Amount, Asset, CallFailure, Chain, ChainError, CipherVault, ErrorKind,
    StandardToken, TokenClient, TokenContract, TokenReturnPolicy, TokenState, VaultConfig,
    VaultError,
};
use cipher_vault_contracts::{
    FailOn, FalseReturnToken, FeeOnTransferToken, NoReturnToken, ReentrantToken, ReentryAction,
    SilentRevertToken,
};

use crate::metrics::VaultMetrics;

const DEMO_SCENARIO: &str = include_str!("../scenarios/demo.json");

// ---------------------------------------------------------------------------
// Scenario Format
// ---------------------------------------------------------------------------

/// A complete scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Vault configuration; defaults apply when absent.
    #[serde(default)]
    pub vault: Option<VaultConfig>,
    /// Account label -> genesis native balance.
    pub accounts: BTreeMap<String, String>,
    /// Tokens deployed before the first step.
    #[serde(default)]
    pub tokens: Vec<TokenDef>,
    /// The script.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parses a scenario from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("malformed scenario")
    }

    /// Loads a scenario from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// The built-in demo scenario.
    pub fn demo() -> Result<Self> {
        Self::from_json(DEMO_SCENARIO)
    }
}

/// A token deployed at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDef {
    /// Name, also used as symbol and as the asset name in steps.
    pub name: String,
    /// Implementation.
    #[serde(flatten)]
    pub kind: TokenKind,
    /// Display precision.
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Initial supply, in token units.
    pub supply: String,
    /// Account holding the initial supply.
    pub holder: String,
}

fn default_decimals() -> u8 {
    NATIVE_DECIMALS
}

/// Token implementations a scenario can deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenKind {
    Standard,
    NoReturn,
    FalseReturn {
        #[serde(default)]
        fail_on: FailOnMode,
    },
    SilentRevert {
        #[serde(default)]
        fail_on: FailOnMode,
    },
    FeeOnTransfer {
        fee_bps: u32,
    },
    Reentrant,
}

/// Serialized form of [`FailOn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailOnMode {
    Transfer,
    TransferFrom,
    #[default]
    Both,
}

impl From<FailOnMode> for FailOn {
    fn from(mode: FailOnMode) -> Self {
        match mode {
            FailOnMode::Transfer => FailOn::Transfer,
            FailOnMode::TransferFrom => FailOn::TransferFrom,
            FailOnMode::Both => FailOn::Both,
        }
    }
}

/// What a reentrant token does when armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentryKind {
    WithdrawToken,
    WithdrawNative,
    TransferToken,
}

fn one() -> usize {
    1
}

fn native() -> String {
    "native".to_string()
}

/// One scripted step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Deposit into the vault.
    Deposit {
        account: String,
        asset: String,
        amount: String,
        #[serde(default)]
        expect: Expect,
    },
    /// Approve a spender (the vault unless given) on a token.
    Approve {
        account: String,
        token: String,
        #[serde(default)]
        spender: Option<String>,
        amount: String,
        #[serde(default)]
        expect: Expect,
    },
    /// Internal vault transfer.
    Transfer {
        account: String,
        to: String,
        asset: String,
        amount: String,
        #[serde(default)]
        expect: Expect,
    },
    /// Withdraw from the vault.
    Withdraw {
        account: String,
        asset: String,
        amount: String,
        #[serde(default)]
        expect: Expect,
    },
    /// Plain transfer on the chain, outside the vault.
    Send {
        account: String,
        to: String,
        #[serde(default = "native")]
        asset: String,
        amount: String,
        #[serde(default)]
        expect: Expect,
    },
    /// Arm a reentrant token against the vault.
    Arm {
        token: String,
        action: ReentryKind,
        amount: String,
        #[serde(default)]
        to: Option<String>,
        #[serde(default = "one")]
        times: usize,
        #[serde(default)]
        propagate: bool,
    },
    /// Check a vault ledger entry.
    ExpectBalance {
        account: String,
        asset: String,
        amount: String,
    },
    /// Check an external holding on the chain.
    ExpectHolding {
        account: String,
        asset: String,
        amount: String,
    },
}

impl Step {
    /// The step's `op` tag.
    pub fn op(&self) -> &'static str {
        match self {
            Step::Deposit { .. } => "deposit",
            Step::Approve { .. } => "approve",
            Step::Transfer { .. } => "transfer",
            Step::Withdraw { .. } => "withdraw",
            Step::Send { .. } => "send",
            Step::Arm { .. } => "arm",
            Step::ExpectBalance { .. } => "expect_balance",
            Step::ExpectHolding { .. } => "expect_holding",
        }
    }
}

/// Expected outcome of a mutating step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Expect {
    /// The step succeeds.
    #[default]
    Ok,
    /// The step fails with this kind.
    Fail(ErrorKind),
}

impl TryFrom<String> for Expect {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == "ok" {
            return Ok(Expect::Ok);
        }
        serde_json::from_value(serde_json::Value::String(s.clone()))
            .map(Expect::Fail)
            .map_err(|_| format!("unknown expectation {s:?}"))
    }
}

impl From<Expect> for String {
    fn from(expect: Expect) -> Self {
        expect.to_string()
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expect::Ok => f.write_str("ok"),
            Expect::Fail(kind) => write!(f, "{kind}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// 1-based position in the script.
    pub index: usize,
    /// The step's `op` tag.
    pub op: &'static str,
    /// Short description of the arguments.
    pub detail: String,
    /// What the scenario expected.
    pub expected: String,
    /// What happened.
    pub outcome: String,
    /// Error message, if the step failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the outcome matched.
    pub passed: bool,
}

/// End-of-run owed vs. held for one asset, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionLine {
    pub asset: String,
    pub owed: String,
    pub held: String,
    pub solvent: bool,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub vault: Address,
    pub steps: Vec<StepRecord>,
    pub positions: Vec<PositionLine>,
}

impl ScenarioReport {
    /// Steps whose outcome differed from the expectation.
    pub fn mismatches(&self) -> usize {
        self.steps.iter().filter(|s| !s.passed).count()
    }

    /// Every asset covered at the end of the run.
    pub fn solvent(&self) -> bool {
        self.positions.iter().all(|p| p.solvent)
    }

    /// No mismatches and solvent.
    pub fn passed(&self) -> bool {
        self.mismatches() == 0 && self.solvent()
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "scenario: {} ({} steps)", self.name, self.steps.len())?;
        writeln!(f, "vault:    {}", self.vault)?;
        for step in &self.steps {
            let mark = if step.passed { "pass" } else { "FAIL" };
            write!(
                f,
                "  {:>3}  {:<14} {:<44} {:<22} {}",
                step.index, step.op, step.detail, step.outcome, mark
            )?;
            if !step.passed {
                write!(f, " (expected {})", step.expected)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "solvency:")?;
        for p in &self.positions {
            let mark = if p.solvent { "ok" } else { "SHORTFALL" };
            writeln!(f, "  {:<12} owed {:<24} held {:<24} {}", p.asset, p.owed, p.held, mark)?;
        }
        let verdict = if self.passed() { "PASSED" } else { "FAILED" };
        write!(f, "result: {} ({} mismatches)", verdict, self.mismatches())
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
enum StepFailure {
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("token {call} failed: {failure}")]
    Token {
        call: &'static str,
        failure: CallFailure,
    },
}

impl StepFailure {
    fn kind(&self) -> ErrorKind {
        match self {
            StepFailure::Vault(err) => err.kind(),
            StepFailure::Chain(_) | StepFailure::Token { .. } => ErrorKind::ExternalCallFailure,
        }
    }
}

#[derive(Debug, Clone)]
struct DeployedToken {
    client: TokenClient,
    decimals: u8,
    reentrant: Option<Arc<ReentrantToken>>,
}

struct Runner<'a> {
    chain: Chain,
    vault: CipherVault,
    accounts: HashMap<String, Address>,
    tokens: BTreeMap<String, DeployedToken>,
    metrics: &'a VaultMetrics,
}

/// Runs `scenario` on a fresh chain with a vault configured by `config`.
///
/// Setup problems (unknown labels, malformed amounts, duplicate names)
/// are errors. Steps that fail are not: they are recorded and compared
/// with their expectation.
pub fn run(scenario: &Scenario, config: VaultConfig, metrics: &VaultMetrics) -> Result<ScenarioReport> {
    info!(scenario = %scenario.name, steps = scenario.steps.len(), "running scenario");
    let mut runner = Runner::new(scenario, config, metrics)?;

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (i, step) in scenario.steps.iter().enumerate() {
        let record = runner
            .execute(i + 1, step)
            .with_context(|| format!("step {} ({})", i + 1, step.op()))?;
        if !record.passed {
            metrics.expectation_mismatches_total.inc();
            warn!(step = record.index, op = record.op, expected = %record.expected, outcome = %record.outcome, "expectation mismatch");
        }
        steps.push(record);
    }

    let positions = runner.positions();
    metrics
        .solvent
        .set(i64::from(positions.iter().all(|p| p.solvent)));

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        vault: runner.vault.address(),
        steps,
        positions,
    })
}

fn parse_amount(input: &str, decimals: u8) -> Result<Amount> {
    if input.eq_ignore_ascii_case("max") {
        return Ok(Amount::MAX);
    }
    parse_units(input, decimals).with_context(|| format!("invalid amount {input:?}"))
}

impl<'a> Runner<'a> {
    fn new(scenario: &Scenario, config: VaultConfig, metrics: &'a VaultMetrics) -> Result<Self> {
        let mut chain = Chain::new();
        let vault = chain.deploy_vault(config);

        let mut accounts = HashMap::new();
        for (label, balance) in &scenario.accounts {
            if matches!(label.as_str(), "vault" | "zero") || label.starts_with("0x") {
                bail!("account label {label:?} is reserved");
            }
            let address = Address::from_label(label);
            let amount = parse_amount(balance, NATIVE_DECIMALS)
                .with_context(|| format!("genesis balance of {label}"))?;
            chain.fund(address, amount)?;
            accounts.insert(label.clone(), address);
            debug!(account = %label, address = %address, "account funded");
        }

        let mut runner = Self {
            chain,
            vault,
            accounts,
            tokens: BTreeMap::new(),
            metrics,
        };
        for def in &scenario.tokens {
            runner.deploy_token(def)?;
        }
        Ok(runner)
    }

    fn deploy_token(&mut self, def: &TokenDef) -> Result<()> {
        if def.name.eq_ignore_ascii_case("native") || self.tokens.contains_key(&def.name) {
            bail!("token name {:?} is reserved or already used", def.name);
        }
        let holder = self.account(&def.holder)?;
        let supply = parse_amount(&def.supply, def.decimals)
            .with_context(|| format!("supply of {}", def.name))?;

        let name = def.name.as_str();
        let mut reentrant = None;
        let code: Arc<dyn TokenContract> = match def.kind {
            TokenKind::Standard => Arc::new(StandardToken::new(name, name, def.decimals)),
            TokenKind::NoReturn => Arc::new(NoReturnToken::new(name, name, def.decimals)),
            TokenKind::FalseReturn { fail_on } => Arc::new(FalseReturnToken::new(
                name,
                name,
                def.decimals,
                fail_on.into(),
            )),
            TokenKind::SilentRevert { fail_on } => Arc::new(SilentRevertToken::new(
                name,
                name,
                def.decimals,
                fail_on.into(),
            )),
            TokenKind::FeeOnTransfer { fee_bps } => {
                Arc::new(FeeOnTransferToken::new(name, name, fee_bps))
            }
            TokenKind::Reentrant => {
                let token = Arc::new(ReentrantToken::new(name, name, def.decimals));
                reentrant = Some(Arc::clone(&token));
                token
            }
        };

        let address = self
            .chain
            .deploy_token(code, TokenState::with_supply(holder, supply));
        debug!(token = %name, address = %address, kind = ?def.kind, "token deployed");
        self.tokens.insert(
            def.name.clone(),
            DeployedToken {
                client: TokenClient::new(address),
                decimals: def.decimals,
                reentrant,
            },
        );
        Ok(())
    }

    fn account(&self, label: &str) -> Result<Address> {
        match label {
            "vault" => Ok(self.vault.address()),
            "zero" => Ok(Address::ZERO),
            hex if hex.starts_with("0x") => {
                Address::from_hex(hex).with_context(|| format!("invalid address {hex:?}"))
            }
            _ => self
                .accounts
                .get(label)
                .copied()
                .with_context(|| format!("unknown account {label:?}")),
        }
    }

    fn token(&self, name: &str) -> Result<&DeployedToken> {
        self.tokens
            .get(name)
            .with_context(|| format!("unknown token {name:?}"))
    }

    fn asset(&self, name: &str) -> Result<(Asset, u8)> {
        if name.eq_ignore_ascii_case("native") {
            return Ok((Asset::Native, NATIVE_DECIMALS));
        }
        let token = self.token(name)?;
        Ok((Asset::Token(token.client.address()), token.decimals))
    }

    fn asset_name(&self, asset: Asset) -> String {
        match asset {
            Asset::Native => "native".to_string(),
            Asset::Token(address) => self
                .tokens
                .iter()
                .find(|(_, t)| t.client.address() == address)
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| address.to_hex()),
        }
    }

    fn decimals(&self, asset: Asset) -> u8 {
        match asset {
            Asset::Native => NATIVE_DECIMALS,
            Asset::Token(address) => self
                .tokens
                .values()
                .find(|t| t.client.address() == address)
                .map(|t| t.decimals)
                .unwrap_or(NATIVE_DECIMALS),
        }
    }

    fn execute(&mut self, index: usize, step: &Step) -> Result<StepRecord> {
        let op = step.op();
        match step {
            Step::Deposit {
                account,
                asset,
                amount,
                expect,
            } => {
                let caller = self.account(account)?;
                let (asset_id, decimals) = self.asset(asset)?;
                let value = parse_amount(amount, decimals)?;
                let result = match asset_id {
                    Asset::Native => self.vault.deposit_native(&mut self.chain, caller, value),
                    Asset::Token(token) => {
                        self.vault
                            .deposit_token(&mut self.chain, caller, token, value)
                    }
                };
                let detail = format!("{account} {amount} {asset}");
                Ok(self.settle(index, op, detail, *expect, result.map(drop).map_err(Into::into)))
            }

            Step::Approve {
                account,
                token,
                spender,
                amount,
                expect,
            } => {
                let owner = self.account(account)?;
                let spender_address = match spender {
                    Some(label) => self.account(label)?,
                    None => self.vault.address(),
                };
                let deployed = self.token(token)?;
                let (client, decimals) = (deployed.client, deployed.decimals);
                let value = parse_amount(amount, decimals)?;
                let outcome = client.approve(&mut self.chain, owner, spender_address, value);
                let result = interpret(outcome, TokenReturnPolicy::AllowEmpty).map_err(|failure| {
                    StepFailure::Token {
                        call: "approve",
                        failure,
                    }
                });
                let detail = format!(
                    "{account} {amount} {token} -> {}",
                    spender.as_deref().unwrap_or("vault")
                );
                Ok(self.settle(index, op, detail, *expect, result))
            }

            Step::Transfer {
                account,
                to,
                asset,
                amount,
                expect,
            } => {
                let caller = self.account(account)?;
                let recipient = self.account(to)?;
                let (asset_id, decimals) = self.asset(asset)?;
                let value = parse_amount(amount, decimals)?;
                let result = self
                    .vault
                    .transfer(&mut self.chain, caller, asset_id, recipient, value);
                let detail = format!("{account} -> {to} {amount} {asset}");
                Ok(self.settle(index, op, detail, *expect, result.map(drop).map_err(Into::into)))
            }

            Step::Withdraw {
                account,
                asset,
                amount,
                expect,
            } => {
                let caller = self.account(account)?;
                let (asset_id, decimals) = self.asset(asset)?;
                let value = parse_amount(amount, decimals)?;
                let result = match asset_id {
                    Asset::Native => self.vault.withdraw_native(&mut self.chain, caller, value),
                    Asset::Token(token) => {
                        self.vault
                            .withdraw_token(&mut self.chain, caller, token, value)
                    }
                };
                let detail = format!("{account} {amount} {asset}");
                Ok(self.settle(index, op, detail, *expect, result.map(drop).map_err(Into::into)))
            }

            Step::Send {
                account,
                to,
                asset,
                amount,
                expect,
            } => {
                let from = self.account(account)?;
                let recipient = self.account(to)?;
                let (asset_id, decimals) = self.asset(asset)?;
                let value = parse_amount(amount, decimals)?;
                let result = match asset_id {
                    Asset::Native => self
                        .chain
                        .send_native(from, recipient, value)
                        .map_err(Into::into),
                    Asset::Token(token) => {
                        let outcome =
                            TokenClient::new(token).transfer(&mut self.chain, from, recipient, value);
                        interpret(outcome, TokenReturnPolicy::AllowEmpty).map_err(|failure| {
                            StepFailure::Token {
                                call: "transfer",
                                failure,
                            }
                        })
                    }
                };
                let detail = format!("{account} -> {to} {amount} {asset}");
                Ok(self.settle(index, op, detail, *expect, result))
            }

            Step::Arm {
                token,
                action,
                amount,
                to,
                times,
                propagate,
            } => {
                let deployed = self.token(token)?.clone();
                let hook = deployed
                    .reentrant
                    .with_context(|| format!("token {token:?} is not reentrant"))?;
                let action = match action {
                    ReentryKind::WithdrawToken => ReentryAction::WithdrawToken {
                        amount: parse_amount(amount, deployed.decimals)?,
                    },
                    ReentryKind::WithdrawNative => ReentryAction::WithdrawNative {
                        amount: parse_amount(amount, NATIVE_DECIMALS)?,
                    },
                    ReentryKind::TransferToken => {
                        let label = to
                            .as_deref()
                            .context("transfer_token reentry needs a `to` account")?;
                        ReentryAction::TransferToken {
                            to: self.account(label)?,
                            amount: parse_amount(amount, deployed.decimals)?,
                        }
                    }
                };
                hook.arm(&self.vault, action, *times, *propagate);
                let detail = format!("{token} {action:?} x{times}");
                Ok(StepRecord {
                    index,
                    op,
                    detail,
                    expected: Expect::Ok.to_string(),
                    outcome: "ok".to_string(),
                    message: None,
                    passed: true,
                })
            }

            Step::ExpectBalance {
                account,
                asset,
                amount,
            } => {
                let who = self.account(account)?;
                let (asset_id, decimals) = self.asset(asset)?;
                let want = parse_amount(amount, decimals)?;
                let got = self.vault.balance_of(&self.chain, asset_id, who);
                let detail = format!("{account} {asset}");
                Ok(compare(index, op, detail, want, got, decimals))
            }

            Step::ExpectHolding {
                account,
                asset,
                amount,
            } => {
                let who = self.account(account)?;
                let (asset_id, decimals) = self.asset(asset)?;
                let want = parse_amount(amount, decimals)?;
                let got = match asset_id {
                    Asset::Native => self.chain.native_balance(who),
                    Asset::Token(token) => self.chain.token_balance_of(token, who),
                };
                let detail = format!("{account} {asset}");
                Ok(compare(index, op, detail, want, got, decimals))
            }
        }
    }

    fn settle(
        &self,
        index: usize,
        op: &'static str,
        detail: String,
        expect: Expect,
        result: Result<(), StepFailure>,
    ) -> StepRecord {
        let (outcome, message, passed) = match &result {
            Ok(()) => ("ok".to_string(), None, expect == Expect::Ok),
            Err(failure) => {
                let kind = failure.kind();
                (
                    kind.to_string(),
                    Some(failure.to_string()),
                    expect == Expect::Fail(kind),
                )
            }
        };
        self.metrics
            .record(op, result.as_ref().err().map(|_| outcome.as_str()));
        debug!(step = index, op, detail = %detail, outcome = %outcome, "step executed");

        StepRecord {
            index,
            op,
            detail,
            expected: expect.to_string(),
            outcome,
            message,
            passed,
        }
    }

    fn positions(&self) -> Vec<PositionLine> {
        self.vault
            .solvency_report(&self.chain)
            .positions
            .into_iter()
            .map(|p| {
                let decimals = self.decimals(p.asset);
                PositionLine {
                    asset: self.asset_name(p.asset),
                    owed: format_units(p.owed, decimals),
                    held: format_units(p.held, decimals),
                    solvent: p.is_solvent(),
                }
            })
            .collect()
    }
}

fn compare(
    index: usize,
    op: &'static str,
    detail: String,
    want: Amount,
    got: Amount,
    decimals: u8,
) -> StepRecord {
    StepRecord {
        index,
        op,
        detail,
        expected: format_units(want, decimals),
        outcome: format_units(got, decimals),
        message: None,
        passed: want == got,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
