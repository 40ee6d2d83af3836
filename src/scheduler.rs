// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::dashboard::Dashboard;

/// Spawn the periodic refresh: every `interval`, run one pipeline cycle.
///
/// Ticks never overlap; a cycle that overruns delays the next tick instead of
/// bursting to catch up. Install the metrics recorder before calling this.
pub fn spawn_refresh_scheduler(dashboard: Arc<Dashboard>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let snap = dashboard.refresh().await;

            counter!("dashboard_refresh_cycles_total").increment(1);
            gauge!("dashboard_last_refresh_ts").set(snap.refreshed_at.timestamp() as f64);
            gauge!("dashboard_kpi_rows").set(snap.kpi.records().len() as f64);
            gauge!("dashboard_activity_rows").set(snap.activity.records().len() as f64);

            tracing::info!(
                target: "refresh",
                areas = snap.areas.len(),
                kpi_rows = snap.kpi.records().len(),
                kpi_status = ?snap.kpi.status(),
                activity_rows = snap.activity.records().len(),
                activity_status = ?snap.activity.status(),
                "refresh tick"
            );
        }
    })
}
