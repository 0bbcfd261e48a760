// Tract Heuristic - Core Library
// Exposes the pipeline stages for the CLI and tests

pub mod config;
pub mod error;
pub mod extractor;
pub mod heuristic;
pub mod parse;
pub mod pipeline;

// Re-export commonly used types
pub use config::{PipelineConfig, SourceSpec, TractColumnPattern, TractRange, LABEL_COLUMN};
pub use error::{PipelineError, Result, ValueKind};
pub use extractor::{
    extract, read_raw_table, run_extractor, write_extracted, ExtractedTable, RawTable,
};
pub use heuristic::{
    blend, combine, combine_tables, invert, l2_norm, l2_normalize, score, write_scores,
    TractScore, INCOME_WEIGHT, VEHICLE_WEIGHT,
};
pub use parse::{parse_income, parse_percent};
pub use pipeline::{run, PipelineReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
