// ⚠️ Pipeline Errors
// One variant per way a run can abort

use std::path::PathBuf;
use thiserror::Error;

/// Which numeric format a cell was expected to have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Comma-grouped integer, e.g. "45,000"
    Income,
    /// Percentage, e.g. "87.3%"
    Percent,
}

impl ValueKind {
    pub fn name(&self) -> &str {
        match self {
            ValueKind::Income => "income",
            ValueKind::Percent => "percent",
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing input file or failed write
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Raw table lacks the row-label column
    #[error("column {column:?} not found in {}", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// Intermediate has no data row, the label never matched
    #[error("no data row in {} (label not found during extraction)", .path.display())]
    MissingLabel { path: PathBuf },

    /// Intermediate has more than one data row
    #[error("expected exactly one data row in {}, found {rows}", .path.display())]
    AmbiguousRows { path: PathBuf, rows: usize },

    /// (rows, columns) of the two intermediates differ
    #[error("shape mismatch: income {income:?} vs vehicle {vehicle:?}")]
    ShapeMismatch {
        income: (usize, usize),
        vehicle: (usize, usize),
    },

    /// Same position, different tract
    #[error("tract mismatch at column {position}: income {income:?} vs vehicle {vehicle:?}")]
    TractMismatch {
        position: usize,
        income: String,
        vehicle: String,
    },

    #[error("cannot parse {} value {value:?} for {tract:?}", .kind.name())]
    Parse {
        kind: ValueKind,
        tract: String,
        value: String,
    },

    /// Console score array could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = PipelineError::ShapeMismatch {
            income: (1, 3),
            vehicle: (1, 2),
        };
        assert_eq!(
            err.to_string(),
            "shape mismatch: income (1, 3) vs vehicle (1, 2)"
        );
    }

    #[test]
    fn test_parse_message_names_kind() {
        let err = PipelineError::Parse {
            kind: ValueKind::Percent,
            tract: "Census Tract 4".to_string(),
            value: "n/a".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("percent"));
        assert!(msg.contains("\"n/a\""));
    }
}
