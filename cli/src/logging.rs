//! # Structured Logging
//!
//! Initializes the `tracing` subscriber for a scenario run.
//!
//! Log output goes to stderr. Stdout carries the scenario report and the
//! metrics dump, so it can be piped on its own. `RUST_LOG` replaces the
//! `--log-level` filter entirely when set.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor `--log-level` parses.
const FALLBACK_FILTER: &str = "cipher_vault=info,cipher_vault_cli=info";

/// The test contracts log every injected failure at `trace`; keep them
/// quiet unless the filter names them explicitly.
const CONTRACTS_DIRECTIVE: &str = "cipher_vault_contracts=warn";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines, no timestamps.
    Pretty,
    /// One flat JSON object per event.
    Json,
}

/// Builds the event filter from `RUST_LOG`, else `level`.
///
/// An unparsable `level` falls back to [`FALLBACK_FILTER`]. The contracts
/// directive is added only when `level` does not mention that crate.
fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directives = if level.contains("cipher_vault_contracts") {
        level.to_string()
    } else {
        format!("{level},{CONTRACTS_DIRECTIVE}")
    };
    EnvFilter::try_new(&directives).unwrap_or_else(|_| {
        eprintln!("ignoring invalid log filter {level:?}");
        EnvFilter::new(format!("{FALLBACK_FILTER},{CONTRACTS_DIRECTIVE}"))
    })
}

/// Initialize the global tracing subscriber.
///
/// Call this exactly once, early in `main()`.
pub fn init_logging(level: &str, format: LogFormat) {
    let filter = build_filter(level);

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .compact()
                        .without_time()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_current_span(false)
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }

    tracing::debug!(?format, level, "logging initialized");
}
