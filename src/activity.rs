//! Activity log: append-only scan events from the "Recent Scanned" sheet.
//! All values stay opaque strings.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{FreshnessCache, LoadOutcome};
use crate::clock::Clock;
use crate::config::DashboardConfig;
use crate::error::LoadError;
use crate::sheets::client::ClientProvider;
use crate::sheets::RawTable;

pub const COL_LINE_NAME: &str = "Line Name";
pub const COL_PROCESS: &str = "Process";
pub const COL_SLEEVE_NAME: &str = "Sleeve Name";
pub const COL_TIME_TAKEN: &str = "Time Taken";

pub const ACTIVITY_RENAMES: [(&str, &str); 3] = [
    ("line", COL_LINE_NAME),
    ("BELT NAME", COL_SLEEVE_NAME),
    ("Duration", COL_TIME_TAKEN),
];

pub const ACTIVITY_COLUMNS: &[&str] = &[COL_LINE_NAME, COL_PROCESS, COL_SLEEVE_NAME, COL_TIME_TAKEN];

/// Serialized keys are the [`ACTIVITY_COLUMNS`] labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    #[serde(rename = "Line Name")]
    pub line_name: String,
    /// "Building" or "Curing".
    #[serde(rename = "Process")]
    pub process: String,
    #[serde(rename = "Sleeve Name")]
    pub sleeve_name: String,
    /// Display value, not parsed.
    #[serde(rename = "Time Taken")]
    pub time_taken: String,
}

/// Rename and project to the four known columns; source order is kept.
pub fn normalize_activity_table(
    mut table: RawTable,
    sheet: &str,
) -> Result<Vec<ActivityRecord>, LoadError> {
    table.rename(&ACTIVITY_RENAMES);

    let line = table.require(sheet, COL_LINE_NAME)?;
    let process = table.require(sheet, COL_PROCESS)?;
    let sleeve = table.require(sheet, COL_SLEEVE_NAME)?;
    let taken = table.require(sheet, COL_TIME_TAKEN)?;

    Ok(table
        .rows()
        .iter()
        .map(|row| ActivityRecord {
            line_name: row[line].clone(),
            process: row[process].clone(),
            sleeve_name: row[sleeve].clone(),
            time_taken: row[taken].clone(),
        })
        .collect())
}

/// Loads the activity sheet through its own freshness cache.
///
/// This sheet may be absent; failures are warnings, not errors.
pub struct ActivityLoader {
    client: Arc<ClientProvider>,
    cache: FreshnessCache<ActivityRecord>,
    spreadsheet_id: String,
    sheet: String,
}

impl ActivityLoader {
    pub fn new(client: Arc<ClientProvider>, clock: Arc<dyn Clock>, cfg: &DashboardConfig) -> Self {
        Self {
            client,
            cache: FreshnessCache::new("activity", cfg.freshness(), cfg.max_stale(), clock),
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            sheet: cfg.activity_sheet.clone(),
        }
    }

    pub async fn load(&self) -> LoadOutcome<ActivityRecord> {
        let out = self.cache.get_or_refresh(|| self.fetch()).await;
        if let LoadOutcome::Unavailable(e) = &out {
            tracing::warn!(
                table = "activity",
                sheet = %self.sheet,
                error = %e,
                "activity log unavailable; make sure the sheet exists"
            );
        }
        out
    }

    async fn fetch(&self) -> Result<Vec<ActivityRecord>, LoadError> {
        let grid = self
            .client
            .fetch_grid(&self.spreadsheet_id, &self.sheet)
            .await?;
        match RawTable::from_grid(grid) {
            Some(table) => normalize_activity_table(table, &self.sheet),
            None => Ok(Vec::new()),
        }
    }
}
