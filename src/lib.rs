// src/lib.rs
// Public library surface for the binary, the probe tool and integration tests.

pub mod activity;
pub mod aggregate;
pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod kpi;
pub mod metrics;
pub mod normalize;
pub mod recent;
pub mod roster;
pub mod scheduler;
pub mod sheets;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::cache::{LoadOutcome, OutcomeStatus};
pub use crate::dashboard::{AreaPanel, Dashboard, DashboardSnapshot};
pub use crate::error::LoadError;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FILTER: &str = "DASHBOARD_LOG";
pub const ENV_LOG_JSON: &str = "DASHBOARD_LOG_JSON";

/// Install the fmt subscriber.
///
/// Filter comes from `DASHBOARD_LOG`, then `RUST_LOG`, then a default. Set
/// `DASHBOARD_LOG_JSON=1` for JSON lines. If the host runtime already
/// installed a subscriber, that one stays.
pub fn init_tracing() {
    let filter = std::env::var(ENV_LOG_FILTER)
        .ok()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("production_dashboard=info,refresh=info,warn"));

    let json = std::env::var(ENV_LOG_JSON).ok().is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed; keeping it");
    }
}

/// Full service: installs the Prometheus recorder, starts the refresh
/// scheduler, and returns the API router with `/metrics` merged in.
///
/// The recorder goes in first so metric descriptions and the first refresh
/// cycle are recorded. Call once per process.
pub fn app(dashboard: Arc<Dashboard>, refresh_interval: Duration) -> anyhow::Result<Router> {
    let metrics = crate::metrics::Metrics::init()?;
    scheduler::spawn_refresh_scheduler(Arc::clone(&dashboard), refresh_interval);
    Ok(create_router(AppState::new(dashboard)).merge(metrics.router()))
}
