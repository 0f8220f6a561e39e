use anyhow::Context;
use axum::{routing::get, Router};
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const DOCUMENTS_ANALYZED: &str = "risk_documents_analyzed_total";
pub const SESSION_RESETS: &str = "risk_session_resets_total";
pub const SCORER_FALLBACKS: &str = "risk_scorer_fallback_total";
pub const EXTRACTION_ERRORS: &str = "risk_extraction_errors_total";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

// Without an installed recorder these are no-ops (tests, library use).

pub fn record_document_analyzed() {
    counter!(DOCUMENTS_ANALYZED).increment(1);
}

pub fn record_session_reset() {
    counter!(SESSION_RESETS).increment(1);
}

/// Fallback scores hide provider outages from the user; count them.
pub fn record_scorer_fallback(provider: &'static str) {
    counter!(SCORER_FALLBACKS, "provider" => provider).increment(1);
}

pub fn record_extraction_error() {
    counter!(EXTRACTION_ERRORS).increment(1);
}
