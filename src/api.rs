//! JSON API consumed by the browser dashboard.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::activity::{ActivityRecord, ACTIVITY_COLUMNS};
use crate::cache::OutcomeView;
use crate::dashboard::{AreaPanel, Dashboard};
use crate::kpi::{KpiRecord, KPI_COLUMNS};

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/snapshot", get(snapshot))
        .route("/api/areas", get(list_areas))
        .route("/api/areas/{area}", get(area_panel))
        .route("/api/recent", get(recent_activity))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    refreshed_at: DateTime<Utc>,
    areas: &'a [String],
    kpi: OutcomeView<'a, KpiRecord>,
    activity: OutcomeView<'a, ActivityRecord>,
}

async fn snapshot(State(state): State<AppState>) -> Response {
    let snap = state.dashboard.refresh().await;
    Json(SnapshotOut {
        refreshed_at: snap.refreshed_at,
        areas: &snap.areas,
        kpi: OutcomeView::new(&snap.kpi, KPI_COLUMNS),
        activity: OutcomeView::new(&snap.activity, ACTIVITY_COLUMNS),
    })
    .into_response()
}

async fn list_areas(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.dashboard.refresh().await.areas)
}

#[derive(Deserialize)]
struct CountQuery {
    #[serde(default)]
    count: Option<usize>,
}

async fn area_panel(
    State(state): State<AppState>,
    Path(area): Path<String>,
    Query(q): Query<CountQuery>,
) -> Json<AreaPanel> {
    Json(state.dashboard.area_panel(&area, q.count).await)
}

#[derive(Deserialize)]
struct RecentQuery {
    line: String,
    process: String,
    #[serde(default)]
    count: Option<usize>,
}

#[derive(Serialize)]
struct RecentOut {
    line: String,
    process: String,
    columns: &'static [&'static str],
    records: Vec<ActivityRecord>,
}

async fn recent_activity(
    State(state): State<AppState>,
    Query(q): Query<RecentQuery>,
) -> Json<RecentOut> {
    let records = state
        .dashboard
        .recent_activity(&q.line, &q.process, q.count)
        .await;
    Json(RecentOut {
        line: q.line,
        process: q.process,
        columns: ACTIVITY_COLUMNS,
        records,
    })
}
