// src/sheets/mod.rs
pub mod client;
pub mod google;

use crate::error::LoadError;

/// Remote tabular data source: returns a sheet as a 2-D grid of cell strings,
/// headers in row 0, exactly as the service hands them out.
#[async_trait::async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_values(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
    ) -> Result<Vec<Vec<String>>, LoadError>;
    fn name(&self) -> &'static str;
}

/// A sheet with its header row split off.
///
/// Only exists while a loader runs; loaders turn it into typed records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Split a grid into headers + rows.
    ///
    /// Returns `None` when the grid has no data rows (empty or header only).
    /// The Sheets API drops trailing empty cells, so short rows are padded
    /// with empty strings; cells beyond the header width are discarded.
    pub fn from_grid(grid: Vec<Vec<String>>) -> Option<Self> {
        if grid.len() < 2 {
            return None;
        }
        let mut it = grid.into_iter();
        let headers: Vec<String> = it.next()?.into_iter().map(|h| h.trim().to_string()).collect();
        let width = headers.len();
        let rows = it
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Some(Self { headers, rows })
    }

    /// Rename headers in place. Headers not named in `map` pass through.
    pub fn rename(&mut self, map: &[(&str, &str)]) {
        for h in &mut self.headers {
            if let Some((_, to)) = map.iter().find(|(from, _)| *from == h.as_str()) {
                *h = (*to).to_string();
            }
        }
    }

    /// Index of the first header equal to `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require(&self, sheet: &str, name: &str) -> Result<usize, LoadError> {
        self.column(name).ok_or_else(|| LoadError::MissingColumn {
            sheet: sheet.to_string(),
            column: name.to_string(),
        })
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}
