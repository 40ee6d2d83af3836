//! Failure taxonomy for the load pipeline.
//!
//! Every loader converts these into a [`crate::cache::LoadOutcome`]; none of
//! them is allowed to escape as a panic or to take the HTTP layer down.

use thiserror::Error;

/// Why a table could not be (re)loaded this cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// Credential missing, malformed, or rejected by the remote service.
    /// Disables all loading for the cycle.
    #[error("auth error: {message}")]
    Auth { message: String },

    /// The named sheet was unreachable, missing, or permission-denied.
    /// Disables that one table only.
    #[error("fetch error on sheet '{sheet}': {message}")]
    Fetch { sheet: String, message: String },

    /// The sheet was fetched but lacks a header the normalizer needs.
    #[error("sheet '{sheet}' is missing required column '{column}'")]
    MissingColumn { sheet: String, column: String },
}

impl LoadError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn fetch(sheet: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            sheet: sheet.into(),
            message: message.into(),
        }
    }

    /// Short label used as a metrics tag and in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::Fetch { .. } => "fetch",
            Self::MissingColumn { .. } => "missing_column",
        }
    }
}

/// A single cell that failed to parse even after sentinel substitution.
///
/// Never propagated as a failure: the cell is coerced to 0 and the defect is
/// logged and counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQualityDefect {
    /// 1-based data row index (the header row is not counted).
    pub row: usize,
    pub column: &'static str,
    pub raw: String,
}

impl std::fmt::Display for DataQualityDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {} column '{}': unparsable value {:?} coerced to 0",
            self.row, self.column, self.raw
        )
    }
}
