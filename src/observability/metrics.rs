//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `vault_controller_reconciliations_total` - Total number of reconciliations
//! - `vault_controller_reconciliation_errors_total` - Total number of reconciliation errors
//! - `vault_controller_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `vault_controller_vault_operations_total` - Total number of Vault API operations by kind and operation
//! - `vault_controller_vault_operation_duration_seconds` - Duration of Vault API operations
//! - `vault_controller_vault_operation_errors_total` - Total number of failed Vault API operations

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_controller_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_controller_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "vault_controller_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

// Vault API metrics with kind and operation labels
static VAULT_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_controller_vault_operations_total",
            "Total number of Vault API operations by resource kind and operation",
        ),
        &["kind", "operation"],
    )
    .expect("Failed to create VAULT_OPERATIONS_TOTAL metric - this should never happen")
});

static VAULT_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "vault_controller_vault_operation_duration_seconds",
            "Duration of Vault API operations in seconds by resource kind and operation",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0]),
        &["kind", "operation"],
    )
    .expect("Failed to create VAULT_OPERATION_DURATION metric - this should never happen")
});

static VAULT_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_controller_vault_operation_errors_total",
            "Total number of failed Vault API operations by resource kind and operation",
        ),
        &["kind", "operation"],
    )
    .expect("Failed to create VAULT_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATION_ERRORS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

/// Record one successful Vault API operation together with its duration.
pub fn record_vault_operation(kind: &str, operation: &str, duration: f64) {
    VAULT_OPERATIONS_TOTAL
        .with_label_values(&[kind, operation])
        .inc();
    VAULT_OPERATION_DURATION
        .with_label_values(&[kind, operation])
        .observe(duration);
}

/// Increment the error counter for one failed Vault API operation.
pub fn increment_vault_operation_errors(kind: &str, operation: &str) {
    VAULT_OPERATION_ERRORS_TOTAL
        .with_label_values(&[kind, operation])
        .inc();
}
