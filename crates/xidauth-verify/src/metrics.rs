//! # Prometheus Metrics
//!
//! Decision and backend-failure counters in a dedicated Prometheus
//! registry. The API server exposes them on `/metrics`; the bridge records
//! them without exporting.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use xidauth_core::AuthState;

use crate::error::VerifyError;

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct AuthMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    decisions_total: IntCounterVec,
    backend_errors_total: IntCounterVec,
    unknown_server_total: IntCounter,
}

impl std::fmt::Debug for AuthMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMetrics").finish_non_exhaustive()
    }
}

impl AuthMetrics {
    /// Create the counters and register them in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let decisions_total = IntCounterVec::new(
            Opts::new("xidauth_decisions_total", "Authorization decisions by state"),
            &["state"],
        )?;
        let backend_errors_total = IntCounterVec::new(
            Opts::new(
                "xidauth_backend_errors_total",
                "Failed backend queries (transport or stale state)",
            ),
            &["kind"],
        )?;
        let unknown_server_total = IntCounter::new(
            "xidauth_unknown_server_total",
            "Requests for XMPP servers without configuration",
        )?;

        registry.register(Box::new(decisions_total.clone()))?;
        registry.register(Box::new(backend_errors_total.clone()))?;
        registry.register(Box::new(unknown_server_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                decisions_total,
                backend_errors_total,
                unknown_server_total,
            }),
        })
    }

    pub fn record_decision(&self, state: AuthState) {
        self.inner
            .decisions_total
            .with_label_values(&[state.as_str()])
            .inc();
    }

    pub fn record_error(&self, err: &VerifyError) {
        match err {
            VerifyError::Transport(_) => self
                .inner
                .backend_errors_total
                .with_label_values(&["transport"])
                .inc(),
            VerifyError::NotUpToDate { .. } => self
                .inner
                .backend_errors_total
                .with_label_values(&["not-up-to-date"])
                .inc(),
            VerifyError::UnknownServer(_) => self.inner.unknown_server_total.inc(),
        }
    }

    /// Current count of decisions with `state`.
    pub fn decisions(&self, state: AuthState) -> u64 {
        self.inner
            .decisions_total
            .with_label_values(&[state.as_str()])
            .get()
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.inner.registry.gather(), &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}
