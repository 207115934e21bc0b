// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("catalog_fetch_total", "Successful full-catalog fetches.");
        describe_counter!(
            "catalog_fetch_errors_total",
            "Catalog fetch failures (network or non-2xx)."
        );
        describe_counter!("filter_runs_total", "Filter/sort pipeline derivations.");
        describe_counter!(
            "compare_requests_total",
            "Comparison requests sent to the ranking service."
        );
        describe_counter!(
            "compare_blocked_total",
            "Comparisons blocked by local validation (never sent)."
        );
        describe_counter!(
            "compare_remote_errors_total",
            "Ranking service failures (network or non-2xx)."
        );
        describe_counter!(
            "candidate_load_failures_total",
            "Candidate ids dropped because their fetch failed."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and expose a static gauge for the
    /// notice TTL.
    pub fn init(notice_ttl_secs: u64) -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        ensure_metrics_described();
        gauge!("notice_ttl_secs").set(notice_ttl_secs as f64);

        Self { handle }
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
