// 📥 Tract Extractor - stages 1 & 2
// Wide census export → one labeled row restricted to the tract columns

use crate::config::{PipelineConfig, SourceSpec, TractColumnPattern, TractRange, LABEL_COLUMN};
use crate::error::{PipelineError, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Raw census table: untyped string cells, one row per semantic label
#[derive(Debug, Clone)]
pub struct RawTable {
    /// File the table was read from, used in error reports
    pub path: PathBuf,
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
}

/// Narrow table: tract columns in source order, usually one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read an intermediate file written by `write_extracted`
    pub fn read(path: &Path) -> Result<Self> {
        let raw = read_raw_table(path)?;
        Ok(ExtractedTable {
            headers: raw.headers.iter().map(str::to_string).collect(),
            rows: raw
                .records
                .iter()
                .map(|r| r.iter().map(str::to_string).collect())
                .collect(),
        })
    }
}

// ============================================================================
// READ / EXTRACT / WRITE
// ============================================================================

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_err(path: &Path) -> impl Fn(csv::Error) -> PipelineError + '_ {
    move |source| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Load a whole CSV (header row required) into memory
pub fn read_raw_table(path: &Path) -> Result<RawTable> {
    let file = open(path)?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = reader.headers().map_err(csv_err(path))?.clone();
    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(csv_err(path))?;

    debug!(
        "read {}: {} columns, {} rows",
        path.display(),
        headers.len(),
        records.len()
    );
    Ok(RawTable {
        path: path.to_path_buf(),
        headers,
        records,
    })
}

/// Keep rows labeled exactly `label` and the pattern columns whose tract is in `range`
///
/// Zero matching rows is not an error here; the combiner rejects it later.
pub fn extract(
    table: &RawTable,
    label: &str,
    pattern: &TractColumnPattern,
    range: &TractRange,
) -> Result<ExtractedTable> {
    let label_idx = table
        .headers
        .iter()
        .position(|h| h == LABEL_COLUMN)
        .ok_or_else(|| PipelineError::MissingColumn {
            path: table.path.clone(),
            column: LABEL_COLUMN.to_string(),
        })?;

    let columns: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| pattern.tract_number(h).is_some_and(|n| range.contains(n)))
        .map(|(i, _)| i)
        .collect();

    let headers = columns
        .iter()
        .map(|&i| table.headers[i].to_string())
        .collect();

    let rows = table
        .records
        .iter()
        .filter(|r| r.get(label_idx) == Some(label))
        .map(|r| {
            columns
                .iter()
                .map(|&i| r.get(i).unwrap_or("").to_string())
                .collect()
        })
        .collect();

    Ok(ExtractedTable { headers, rows })
}

/// Write headers plus rows, no index column
pub fn write_extracted(table: &ExtractedTable, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = WriterBuilder::new().from_writer(file);

    // An empty record would be written as `""`, which reads back as one column
    if !table.headers.is_empty() {
        writer.write_record(&table.headers).map_err(csv_err(path))?;
        for row in &table.rows {
            writer.write_record(row).map_err(csv_err(path))?;
        }
    }

    writer.flush().map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// read → extract → write for one source
pub fn run_extractor(source: &SourceSpec, config: &PipelineConfig) -> Result<ExtractedTable> {
    let input = config.resolve(&source.input);
    let output = config.resolve(&source.output);
    info!("extracting {:?} from {}", source.label, input.display());

    let raw = read_raw_table(&input)?;
    let pattern = config.pattern_for(source);
    let table = extract(&raw, &source.label, &pattern, &config.tract_range)?;

    if table.is_empty() {
        warn!(
            "label {:?} not found in {}; writing header-only {}",
            source.label,
            input.display(),
            output.display()
        );
    }
    debug!(
        "matched {} tract columns in {}",
        table.headers.len(),
        input.display()
    );

    write_extracted(&table, &output)?;
    info!(
        "wrote {} ({} rows x {} columns)",
        output.display(),
        table.shape().0,
        table.shape().1
    );
    Ok(table)
}
