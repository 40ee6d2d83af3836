//! KPI aggregation view: per-Area layout with display-ready metrics.

use serde::Serialize;

use crate::kpi::KpiRecord;
use crate::roster::{LineKey, Operator, OperatorRoster};

pub const BUILDING: &str = "Building";
pub const CURING: &str = "Curing";

/// One production line as the dashboard shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    pub key: LineKey,
    /// "Target"
    pub planned_sleeves: u64,
    /// "Completed"
    pub sleeves_build: u64,
    /// "Pending"
    pub not_produced_sleeves: u64,
    pub production_rate: f64,
    pub rate_display: String,
    /// Built minus planned; `None` when nothing was planned.
    pub delta: Option<i64>,
    pub operators: Vec<Operator>,
}

impl LineView {
    pub fn from_record(r: &KpiRecord) -> Self {
        Self {
            key: r.line_key(),
            planned_sleeves: r.planned_sleeves,
            sleeves_build: r.sleeves_build,
            not_produced_sleeves: r.not_produced_sleeves,
            production_rate: r.production_rate_display,
            rate_display: format_rate(r.production_rate_display),
            delta: delta(r.planned_sleeves, r.sleeves_build),
            operators: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum AreaLayout {
    /// Area has both a Building and a Curing line.
    Split { building: LineView, curing: LineView },
    /// Any other Area: the first line found. The front-end notes that the
    /// split view is unavailable.
    Single { line: LineView },
    /// No KPI rows for this Area.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaView {
    pub area: String,
    #[serde(flatten)]
    pub layout: AreaLayout,
}

impl AreaView {
    pub fn lines(&self) -> Vec<&LineView> {
        match &self.layout {
            AreaLayout::Split { building, curing } => vec![building, curing],
            AreaLayout::Single { line } => vec![line],
            AreaLayout::Empty => Vec::new(),
        }
    }

    pub fn attach_operators(&mut self, roster: &OperatorRoster) {
        let lines: Vec<&mut LineView> = match &mut self.layout {
            AreaLayout::Split { building, curing } => vec![building, curing],
            AreaLayout::Single { line } => vec![line],
            AreaLayout::Empty => Vec::new(),
        };
        for l in lines {
            l.operators = roster.operators(&l.key).to_vec();
        }
    }
}

/// Slice `records` to one Area and lay its lines out.
///
/// When several rows share the same Line, the first one wins.
pub fn aggregate(records: &[KpiRecord], area: &str) -> AreaView {
    let rows: Vec<&KpiRecord> = records.iter().filter(|r| r.area == area).collect();
    let first_line = |name: &str| rows.iter().find(|r| r.line == name).copied();

    let layout = match (first_line(BUILDING), first_line(CURING)) {
        (Some(b), Some(c)) => AreaLayout::Split {
            building: LineView::from_record(b),
            curing: LineView::from_record(c),
        },
        _ => match rows.first() {
            Some(r) => AreaLayout::Single {
                line: LineView::from_record(r),
            },
            None => AreaLayout::Empty,
        },
    };

    AreaView {
        area: area.to_string(),
        layout,
    }
}

/// Built minus planned, only meaningful when something was planned.
///
/// Saturates at the `i64` bounds; counts come straight from sheet cells.
pub fn delta(planned: u64, built: u64) -> Option<i64> {
    (planned > 0).then(|| {
        let d = i128::from(built) - i128::from(planned);
        d.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    })
}

/// `"100%"` for exactly 1.0, otherwise one decimal (`0.876` → `"87.6%"`).
/// Expects a value already rounded to 3 decimals.
pub fn format_rate(rounded: f64) -> String {
    if rounded == 1.0 {
        "100%".to_string()
    } else {
        format!("{:.1}%", rounded * 100.0)
    }
}

/// Distinct Areas in first-seen order.
pub fn areas(records: &[KpiRecord]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in records {
        if !out.iter().any(|a| a == &r.area) {
            out.push(r.area.clone());
        }
    }
    out
}
