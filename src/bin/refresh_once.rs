//! Runs one refresh cycle against the configured spreadsheet and prints the
//! result as JSON. Handy for checking a credential or a sheet layout.

use production_dashboard::{
    activity::ACTIVITY_COLUMNS,
    cache::OutcomeView,
    config::{DashboardConfig, ServiceCredential},
    kpi::KPI_COLUMNS,
    Dashboard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    production_dashboard::init_tracing();

    let cfg = DashboardConfig::load_default()?;
    let dashboard = Dashboard::from_config(&cfg, ServiceCredential::from_env());
    let snap = dashboard.refresh().await;

    let out = serde_json::json!({
        "refreshed_at": snap.refreshed_at,
        "areas": snap.areas,
        "kpi": OutcomeView::new(&snap.kpi, KPI_COLUMNS),
        "activity": OutcomeView::new(&snap.activity, ACTIVITY_COLUMNS),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);

    if let Some(area) = snap.areas.first() {
        let panel = dashboard.area_panel(area, None).await;
        println!("{}", serde_json::to_string_pretty(&panel)?);
    }
    Ok(())
}
