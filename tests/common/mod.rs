// tests/common/mod.rs
// Fake remote source + connector shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use production_dashboard::clock::ManualClock;
use production_dashboard::config::DashboardConfig;
use production_dashboard::sheets::client::Connector;
use production_dashboard::sheets::SheetSource;
use production_dashboard::{Dashboard, LoadError};

pub const KPI_SHEET: &str = "Calculation";
pub const ACTIVITY_SHEET: &str = "Recent Scanned";

pub fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

pub const KPI_HEADER: &[&str] = &["Area", "Line", "Planning", "Building", "Pending", "Percentage"];
pub const ACTIVITY_HEADER: &[&str] = &["line", "Process", "BELT NAME", "Duration"];

#[derive(Default)]
pub struct FakeSheets {
    sheets: Mutex<HashMap<String, Result<Vec<Vec<String>>, LoadError>>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl FakeSheets {
    pub fn set(&self, sheet: &str, grid: Vec<Vec<String>>) {
        self.sheets
            .lock()
            .unwrap()
            .insert(sheet.to_string(), Ok(grid));
    }

    pub fn fail(&self, sheet: &str, err: LoadError) {
        self.sheets
            .lock()
            .unwrap()
            .insert(sheet.to_string(), Err(err));
    }

    pub fn fetches(&self, sheet: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(sheet)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SheetSource for FakeSheets {
    async fn fetch_values(
        &self,
        _spreadsheet_id: &str,
        sheet: &str,
    ) -> Result<Vec<Vec<String>>, LoadError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(sheet.to_string())
            .or_default() += 1;
        self.sheets
            .lock()
            .unwrap()
            .get(sheet)
            .cloned()
            .unwrap_or_else(|| Err(LoadError::fetch(sheet, "WorksheetNotFound")))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeConnector {
    pub sheets: Arc<FakeSheets>,
    pub reject: AtomicBool,
    pub connects: AtomicUsize,
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> Result<Arc<dyn SheetSource>, LoadError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Err(LoadError::auth("invalid_grant"));
        }
        let source: Arc<dyn SheetSource> = self.sheets.clone();
        Ok(source)
    }
}

pub struct Harness {
    pub sheets: Arc<FakeSheets>,
    pub connector: Arc<FakeConnector>,
    pub clock: Arc<ManualClock>,
    pub dashboard: Arc<Dashboard>,
}

pub fn test_config() -> DashboardConfig {
    DashboardConfig {
        spreadsheet_id: "test-spreadsheet".into(),
        ..DashboardConfig::default()
    }
}

pub fn harness_with(cfg: DashboardConfig) -> Harness {
    let sheets = Arc::new(FakeSheets::default());
    let connector = Arc::new(FakeConnector {
        sheets: sheets.clone(),
        reject: AtomicBool::new(false),
        connects: AtomicUsize::new(0),
    });
    let clock = Arc::new(ManualClock::new());
    let dashboard = Arc::new(Dashboard::new(&cfg, connector.clone(), clock.clone()));
    Harness {
        sheets,
        connector,
        clock,
        dashboard,
    }
}

pub fn harness() -> Harness {
    harness_with(test_config())
}
