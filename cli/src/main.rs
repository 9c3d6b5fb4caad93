// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Cipher Vault Scenario Runner
//!
//! Entry point for the `cipher-vault` binary. Parses CLI arguments,
//! initializes logging and metrics, runs a scenario against a freshly
//! deployed vault, and prints the report.
//!
//! Subcommands:
//!
//! - `simulate <file>` runs a scenario file
//! - `demo` runs the built-in scenario
//! - `version` prints build information
//!
//! The process exits non-zero if any step's outcome differs from its
//! expectation or the vault ends insolvent.

mod cli;
mod logging;
mod metrics;
mod scenario;

use anyhow::{bail, Context, Result};
use clap::Parser;

use cipher_vault::config::{MAX_CALL_DEPTH, NATIVE_DECIMALS, NATIVE_SYMBOL};
use cipher_vault::VaultConfig;

use cli::{CipherVaultCli, Commands, RunArgs};
use metrics::VaultMetrics;
use scenario::Scenario;

fn main() -> Result<()> {
    let cli = CipherVaultCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Simulate(args) => {
            let scenario = Scenario::load(&args.file)?;
            run(scenario, &args.run, cli.metrics)
        }
        Commands::Demo(args) => run(Scenario::demo()?, &args, cli.metrics),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs one scenario and prints its report.
///
/// The vault configuration comes from `--config` if given, else from the
/// scenario's own `vault` section, else the defaults.
fn run(scenario: Scenario, args: &RunArgs, with_metrics: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => VaultConfig::load(path)
            .with_context(|| format!("failed to load vault config {}", path.display()))?,
        None => scenario.vault.clone().unwrap_or_default(),
    };
    tracing::info!(
        policy = ?config.token_return_policy,
        precheck = config.precheck_token_deposits,
        check_solvency = config.check_solvency,
        "vault configuration"
    );

    let metrics = VaultMetrics::new();
    let report = scenario::run(&scenario, config, &metrics)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    if with_metrics {
        let text = metrics.encode().context("failed to encode metrics")?;
        print!("{text}");
    }

    if !report.solvent() {
        bail!("scenario {:?} left the vault insolvent", report.name);
    }
    if report.mismatches() > 0 {
        bail!(
            "scenario {:?}: {} step(s) did not match their expectation",
            report.name,
            report.mismatches()
        );
    }
    tracing::info!(scenario = %report.name, steps = report.steps.len(), "scenario passed");
    Ok(())
}

/// Prints build version information.
fn print_version() {
    println!("cipher-vault {}", env!("CARGO_PKG_VERSION"));
    println!("native       {NATIVE_SYMBOL} ({NATIVE_DECIMALS} decimals)");
    println!("call depth   {MAX_CALL_DEPTH}");
    println!("rustc        {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
