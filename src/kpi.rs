//! KPI table: per-line production counts from the "Calculation" sheet.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;

use crate::cache::{FreshnessCache, LoadOutcome};
use crate::clock::Clock;
use crate::config::DashboardConfig;
use crate::error::{DataQualityDefect, LoadError};
use crate::normalize::{coerce_count, coerce_rate, round3, Normalized};
use crate::roster::LineKey;
use crate::sheets::client::ClientProvider;
use crate::sheets::RawTable;

pub const COL_AREA: &str = "Area";
pub const COL_LINE: &str = "Line";
pub const COL_PLANNED: &str = "Planned Sleeves";
pub const COL_BUILT: &str = "Sleeves Build";
pub const COL_PENDING: &str = "Not Produced Sleeves";
pub const COL_RATE: &str = "Production rate %";

/// Sheet header → normalized column name.
pub const KPI_RENAMES: [(&str, &str); 4] = [
    ("Planning", COL_PLANNED),
    ("Building", COL_BUILT),
    ("Pending", COL_PENDING),
    ("Percentage", COL_RATE),
];

pub const KPI_COLUMNS: &[&str] = &[
    COL_AREA,
    COL_LINE,
    COL_PLANNED,
    COL_BUILT,
    COL_PENDING,
    COL_RATE,
    "Production rate Display",
    "Area_Line_Key",
];

/// Serialized keys are the [`KPI_COLUMNS`] labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRecord {
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Line")]
    pub line: String,
    #[serde(rename = "Planned Sleeves")]
    pub planned_sleeves: u64,
    #[serde(rename = "Sleeves Build")]
    pub sleeves_build: u64,
    #[serde(rename = "Not Produced Sleeves")]
    pub not_produced_sleeves: u64,
    /// Fraction, 1.0 = 100%. May exceed 1.0.
    #[serde(rename = "Production rate %")]
    pub production_rate: f64,
    /// `production_rate` rounded to 3 decimals.
    #[serde(rename = "Production rate Display")]
    pub production_rate_display: f64,
    /// `"{area} - {line}"`
    #[serde(rename = "Area_Line_Key")]
    pub area_line_key: String,
}

impl KpiRecord {
    pub fn line_key(&self) -> LineKey {
        LineKey::new(&self.area, &self.line)
    }
}

/// Turn a raw KPI sheet into records.
///
/// Fails only when a required column is missing; bad cells become 0 and are
/// reported in `defects`.
pub fn normalize_kpi_table(
    mut table: RawTable,
    sheet: &str,
) -> Result<Normalized<KpiRecord>, LoadError> {
    table.rename(&KPI_RENAMES);

    let area = table.require(sheet, COL_AREA)?;
    let line = table.require(sheet, COL_LINE)?;
    let planned = table.require(sheet, COL_PLANNED)?;
    let built = table.require(sheet, COL_BUILT)?;
    let pending = table.require(sheet, COL_PENDING)?;
    let rate = table.require(sheet, COL_RATE)?;

    let mut defects = Vec::new();
    let mut records = Vec::with_capacity(table.rows().len());

    for (i, row) in table.rows().iter().enumerate() {
        let mut count = |idx: usize, column: &'static str| {
            coerce_count(&row[idx]).unwrap_or_else(|| {
                defects.push(DataQualityDefect {
                    row: i + 1,
                    column,
                    raw: row[idx].clone(),
                });
                0
            })
        };
        let planned_sleeves = count(planned, COL_PLANNED);
        let sleeves_build = count(built, COL_BUILT);
        let not_produced_sleeves = count(pending, COL_PENDING);

        let production_rate = coerce_rate(&row[rate]).unwrap_or_else(|| {
            defects.push(DataQualityDefect {
                row: i + 1,
                column: COL_RATE,
                raw: row[rate].clone(),
            });
            0.0
        });

        let area = row[area].clone();
        let line = row[line].clone();
        records.push(KpiRecord {
            area_line_key: LineKey::new(&area, &line).to_string(),
            area,
            line,
            planned_sleeves,
            sleeves_build,
            not_produced_sleeves,
            production_rate,
            production_rate_display: round3(production_rate),
        });
    }

    Ok(Normalized { records, defects })
}

/// Loads the KPI sheet through its own freshness cache.
pub struct KpiLoader {
    client: Arc<ClientProvider>,
    cache: FreshnessCache<KpiRecord>,
    spreadsheet_id: String,
    sheet: String,
}

impl KpiLoader {
    pub fn new(client: Arc<ClientProvider>, clock: Arc<dyn Clock>, cfg: &DashboardConfig) -> Self {
        Self {
            client,
            cache: FreshnessCache::new("kpi", cfg.freshness(), cfg.max_stale(), clock),
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            sheet: cfg.kpi_sheet.clone(),
        }
    }

    pub async fn load(&self) -> LoadOutcome<KpiRecord> {
        let out = self.cache.get_or_refresh(|| self.fetch()).await;
        if let LoadOutcome::Unavailable(e) = &out {
            tracing::error!(
                table = "kpi",
                sheet = %self.sheet,
                error = %e,
                "KPI table unavailable; check sheet id, name and permissions"
            );
        }
        out
    }

    async fn fetch(&self) -> Result<Vec<KpiRecord>, LoadError> {
        let grid = self
            .client
            .fetch_grid(&self.spreadsheet_id, &self.sheet)
            .await?;
        let Some(table) = RawTable::from_grid(grid) else {
            tracing::warn!(sheet = %self.sheet, "KPI sheet is empty or only contains headers");
            return Ok(Vec::new());
        };

        let Normalized { records, defects } = normalize_kpi_table(table, &self.sheet)?;
        for d in &defects {
            counter!("dashboard_cell_defects_total", "table" => "kpi", "column" => d.column)
                .increment(1);
            tracing::warn!(table = "kpi", defect = %d, "data quality defect");
        }
        tracing::debug!(
            rows = records.len(),
            defects = defects.len(),
            "KPI table refreshed"
        );
        Ok(records)
    }
}
