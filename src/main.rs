//! Production Dashboard: binary entrypoint.
//! Loads config + service-account secret, starts the refresh scheduler, and
//! serves the JSON API and `/metrics` through Axum on Shuttle.

use std::sync::Arc;

use production_dashboard::{
    config::{credential::ENV_SERVICE_ACCOUNT, DashboardConfig, ServiceCredential},
    Dashboard,
};
use shuttle_axum::ShuttleAxum;
use shuttle_runtime::SecretStore;

#[shuttle_runtime::main]
async fn axum(#[shuttle_runtime::Secrets] secrets: SecretStore) -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    production_dashboard::init_tracing();

    let cfg = DashboardConfig::load_default()
        .map_err(|e| shuttle_runtime::Error::Custom(e.context("loading dashboard config")))?;

    // Secret store first, environment second. A missing credential is not
    // fatal: the API still serves, with every table reported unavailable.
    let credential = secrets
        .get(ENV_SERVICE_ACCOUNT)
        .and_then(ServiceCredential::new)
        .or_else(ServiceCredential::from_env);
    if credential.is_none() {
        tracing::error!(
            "no '{ENV_SERVICE_ACCOUNT}' secret configured; dashboard data is disabled"
        );
    }

    tracing::info!(
        spreadsheet = %cfg.spreadsheet_id,
        kpi_sheet = %cfg.kpi_sheet,
        activity_sheet = %cfg.activity_sheet,
        freshness_secs = cfg.freshness_secs,
        refresh_secs = cfg.refresh_interval_secs,
        operators = cfg.operators.len(),
        "dashboard config loaded"
    );

    let dashboard = Arc::new(Dashboard::from_config(&cfg, credential));
    let router = production_dashboard::app(dashboard, cfg.refresh_interval())
        .map_err(|e| shuttle_runtime::Error::Custom(e.context("starting dashboard service")))?;

    Ok(router.into())
}
