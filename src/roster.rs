//! Operators per production line, keyed by a value-typed (Area, Line) pair.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::config::OperatorEntry;

/// Identifies one production line: an Area plus its Line ("Building", "Curing", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineKey {
    pub area: String,
    pub line: String,
}

impl LineKey {
    pub fn new(area: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            line: line.into(),
        }
    }
}

/// Renders as `"Area - Line"`, the join key used by the sheet.
impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.area, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    pub name: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OperatorRoster {
    by_line: HashMap<LineKey, Vec<Operator>>,
}

impl OperatorRoster {
    /// Build from config entries; order within a line is kept.
    pub fn from_entries(entries: &[OperatorEntry]) -> Self {
        let mut by_line: HashMap<LineKey, Vec<Operator>> = HashMap::new();
        for e in entries {
            let name = e.name.trim();
            if name.is_empty() {
                continue;
            }
            by_line
                .entry(LineKey::new(e.area.trim(), e.line.trim()))
                .or_default()
                .push(Operator {
                    name: name.to_string(),
                    photo: e.photo.clone(),
                });
        }
        Self { by_line }
    }

    /// Operators for a line; empty when none are listed.
    pub fn operators(&self, key: &LineKey) -> &[Operator] {
        self.by_line.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}
