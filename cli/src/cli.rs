//! # CLI Interface
//!
//! Argument structure for `cipher-vault`, using `clap` derive. Subcommands:
//! `simulate`, `demo`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Cipher Vault scenario runner.
///
/// Deploys a vault on an in-memory chain, replays a JSON scenario of
/// deposits, transfers and withdrawals against it, and checks every step
/// against its expected outcome.
#[derive(Parser, Debug)]
#[command(
    name = "cipher-vault",
    about = "Custodial vault scenario runner",
    version,
    propagate_version = true
)]
pub struct CipherVaultCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(
        long,
        global = true,
        env = "CIPHER_VAULT_LOG_LEVEL",
        default_value = "cipher_vault=info,cipher_vault_cli=info"
    )]
    pub log_level: String,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "CIPHER_VAULT_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Print Prometheus metrics for the run to stdout.
    #[arg(long, global = true, env = "CIPHER_VAULT_METRICS")]
    pub metrics: bool,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario file.
    Simulate(SimulateArgs),
    /// Run the built-in demo scenario.
    Demo(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Path to the scenario (JSON).
    pub file: PathBuf,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Options shared by every subcommand that runs a scenario.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Vault configuration (JSON). Overrides the scenario's own `vault`
    /// section.
    #[arg(long, short = 'c', env = "CIPHER_VAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}
