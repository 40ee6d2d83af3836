// tests/api_http.rs
//
// HTTP-level tests for the dashboard Router without opening sockets.
// Requests go through tower::ServiceExt::oneshot against a fake sheet source.

mod common;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _;

use common::*;
use production_dashboard::{create_router, AppState};

const BODY_LIMIT: usize = 1024 * 1024;

fn seeded() -> (Harness, Router) {
    let h = harness();
    h.sheets.set(
        KPI_SHEET,
        grid(&[
            KPI_HEADER,
            &["Line-1", "Building", "1,200", "1,050", "150", "87.5%"],
            &["Line-1", "Curing", "900", "900", "0", "100%"],
            &["Line-MMV", "Building", "0", "0", "0", "#DIV/0!"],
        ]),
    );
    let app = create_router(AppState::new(h.dashboard.clone()));
    (h, app)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).expect("parse json");
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let (_h, app) = seeded();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(String::from_utf8_lossy(&bytes), "ok");
}

#[tokio::test]
async fn snapshot_reports_per_table_status_and_stable_columns() {
    let (_h, app) = seeded();
    let (status, v) = get_json(app, "/api/snapshot").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(v["areas"], serde_json::json!(["Line-1", "Line-MMV"]));
    assert_eq!(v["kpi"]["status"], "fresh");
    assert_eq!(v["kpi"]["records"].as_array().map(Vec::len), Some(3));
    assert_eq!(v["kpi"]["records"][0]["Area_Line_Key"], "Line-1 - Building");
    assert_eq!(v["kpi"]["records"][0]["Planned Sleeves"], 1200);

    // Activity sheet is missing from the fake: no records, but the schema stays.
    assert_eq!(v["activity"]["status"], "unavailable");
    assert_eq!(v["activity"]["error_kind"], "fetch");
    assert!(v["activity"]["records"].as_array().is_some_and(|r| r.is_empty()));
    assert_eq!(
        v["activity"]["columns"],
        serde_json::json!(["Line Name", "Process", "Sleeve Name", "Time Taken"])
    );
}

#[tokio::test]
async fn area_endpoint_returns_split_layout() {
    let (_h, app) = seeded();
    let (status, v) = get_json(app, "/api/areas/Line-1").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(v["area"], "Line-1");
    assert_eq!(v["layout"], "split");
    assert_eq!(v["building"]["rate_display"], "87.5%");
    assert_eq!(v["building"]["delta"], -150);
    assert_eq!(v["curing"]["rate_display"], "100%");
    assert_eq!(v["kpi_status"], "fresh");
    assert_eq!(v["activity_status"], "unavailable");
}

#[tokio::test]
async fn area_without_plan_omits_delta() {
    let (_h, app) = seeded();
    let (_, v) = get_json(app, "/api/areas/Line-MMV").await;
    assert_eq!(v["layout"], "single");
    assert!(v["line"]["delta"].is_null());
    assert_eq!(v["line"]["rate_display"], "0.0%");
}

#[tokio::test]
async fn recent_endpoint_filters_and_limits() {
    let (h, app) = seeded();
    h.sheets.set(
        ACTIVITY_SHEET,
        grid(&[
            ACTIVITY_HEADER,
            &["Line-1", "Curing", "C-1", "10 min"],
            &["Line-1", "Building", "B-1", "5 min"],
            &["Line-1", "Curing", "C-2", "12 min"],
            &["Line-1", "Curing", "C-3", "11 min"],
        ]),
    );

    let (status, v) = get_json(app, "/api/recent?line=Line-1&process=Curing&count=2").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = v["records"]
        .as_array()
        .expect("records array")
        .iter()
        .filter_map(|r| r["Sleeve Name"].as_str())
        .collect();
    assert_eq!(names, vec!["C-2", "C-3"]);
    assert_eq!(v["columns"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn recent_requires_line_and_process() {
    let (_h, app) = seeded();
    let req = Request::builder()
        .uri("/api/recent?line=Line-1")
        .body(Body::empty())
        .expect("build GET /api/recent");
    let resp = app.oneshot(req).await.expect("oneshot /api/recent");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
