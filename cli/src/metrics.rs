//! # Prometheus Metrics
//!
//! Counters for a scenario run, dumped in the Prometheus text format when
//! `--metrics` is passed.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] under the
//! `cipher_vault` namespace.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Metric handles for one run.
#[derive(Clone)]
pub struct VaultMetrics {
    registry: Registry,
    /// Operations executed, by `op` and `outcome` (`ok` or an error kind).
    pub operations_total: IntCounterVec,
    /// Failed operations, by error `kind`.
    pub failures_total: IntCounterVec,
    /// Steps whose result differed from the scenario's expectation.
    pub expectation_mismatches_total: IntCounter,
    /// 1 if the vault ended the run solvent in every asset, else 0.
    pub solvent: IntGauge,
}

impl VaultMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("cipher_vault".into()), None)
            .expect("failed to create prometheus registry");

        let operations_total = IntCounterVec::new(
            Opts::new("operations_total", "Vault and chain operations executed"),
            &["op", "outcome"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(operations_total.clone()))
            .expect("metric registration");

        let failures_total = IntCounterVec::new(
            Opts::new("failures_total", "Failed operations by error kind"),
            &["kind"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(failures_total.clone()))
            .expect("metric registration");

        let expectation_mismatches_total = IntCounter::new(
            "expectation_mismatches_total",
            "Scenario steps whose outcome did not match the expectation",
        )
        .expect("metric creation");
        registry
            .register(Box::new(expectation_mismatches_total.clone()))
            .expect("metric registration");

        let solvent = IntGauge::new("solvent", "Whether holdings cover liabilities in every asset")
            .expect("metric creation");
        registry
            .register(Box::new(solvent.clone()))
            .expect("metric registration");

        Self {
            registry,
            operations_total,
            failures_total,
            expectation_mismatches_total,
            solvent,
        }
    }

    /// Counts one operation. `failure_kind` is `None` on success.
    pub fn record(&self, op: &str, failure_kind: Option<&str>) {
        let outcome = failure_kind.unwrap_or("ok");
        self.operations_total
            .with_label_values(&[op, outcome])
            .inc();
        if let Some(kind) = failure_kind {
            self.failures_total.with_label_values(&[kind]).inc();
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition
    /// format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for VaultMetrics {
    fn default() -> Self {
        Self::new()
    }
}
