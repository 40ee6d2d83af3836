use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("dashboard_fetch_total", "Successful sheet fetches.");
        describe_counter!(
            "dashboard_fetch_errors_total",
            "Failed table refreshes by table and error kind."
        );
        describe_counter!(
            "dashboard_auth_errors_total",
            "Failed attempts to build an authenticated sheets client."
        );
        describe_counter!(
            "dashboard_cache_hits_total",
            "Loads served from the freshness cache."
        );
        describe_counter!(
            "dashboard_stale_served_total",
            "Loads that served the last good snapshot after a failed refresh."
        );
        describe_counter!(
            "dashboard_cell_defects_total",
            "Cells that failed to parse and were coerced to 0."
        );
        describe_counter!("dashboard_refresh_cycles_total", "Scheduler refresh cycles.");
        describe_histogram!("dashboard_fetch_ms", "Sheet fetch time in milliseconds.");
        describe_gauge!(
            "dashboard_last_refresh_ts",
            "Unix ts when the refresh scheduler last ran."
        );
        describe_gauge!("dashboard_kpi_rows", "KPI rows in the last refresh.");
        describe_gauge!("dashboard_activity_rows", "Activity rows in the last refresh.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder.
    ///
    /// Fails if another recorder is already installed (e.g. twice in one process).
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
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
