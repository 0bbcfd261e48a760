// ⚙️ Pipeline Configuration
// Defaults reproduce the Hamilton County, TN run; a TOML file can override any subset

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Column holding the semantic row label in census exports
pub const LABEL_COLUMN: &str = "Label (Grouping)";

/// Separator between the geography, segment and measure parts of a column name
const PART_SEPARATOR: &str = "!!";

// ============================================================================
// TRACT RANGE
// ============================================================================

/// Inclusive range of tract numbers to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TractRange {
    pub start: u32,
    pub end: u32,
}

impl Default for TractRange {
    fn default() -> Self {
        TractRange { start: 4, end: 124 }
    }
}

impl TractRange {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        let range = TractRange { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(PipelineError::Config(format!(
                "tract range start {} is after end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn contains(&self, n: u32) -> bool {
        (self.start..=self.end).contains(&n)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// TRACT COLUMN PATTERN
// ============================================================================

/// Builds and recognizes per-tract column names:
/// `Census Tract {n}, {county}, {state}!!{segment}!!Estimate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TractColumnPattern {
    pub county: String,
    pub state: String,
    pub segment: String,
}

impl TractColumnPattern {
    pub fn new(county: &str, state: &str, segment: &str) -> Self {
        TractColumnPattern {
            county: county.to_string(),
            state: state.to_string(),
            segment: segment.to_string(),
        }
    }

    pub fn column_name(&self, n: u32) -> String {
        format!(
            "Census Tract {}, {}, {}!!{}!!Estimate",
            n, self.county, self.state, self.segment
        )
    }

    /// Tract number of `column` if it is exactly an instance of this pattern
    pub fn tract_number(&self, column: &str) -> Option<u32> {
        let suffix = format!(
            ", {}, {}!!{}!!Estimate",
            self.county, self.state, self.segment
        );
        let digits = column
            .strip_prefix("Census Tract ")?
            .strip_suffix(suffix.as_str())?;
        let n: u32 = digits.parse().ok()?;

        // Rejects "04", "+4" and similar spellings
        if self.column_name(n) == column {
            Some(n)
        } else {
            None
        }
    }

    /// Geography part of a column name, shared by every segment of a tract
    ///
    /// "Census Tract 4, Hamilton County, Tennessee!!Total!!Estimate"
    /// → "Census Tract 4, Hamilton County, Tennessee"
    pub fn geography(column: &str) -> &str {
        column
            .split_once(PART_SEPARATOR)
            .map(|(geo, _)| geo)
            .unwrap_or(column)
    }
}

// ============================================================================
// SOURCES
// ============================================================================

/// One extractor stage: where to read, which row, which segment, where to write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSpec {
    pub input: PathBuf,
    pub output: PathBuf,
    pub label: String,
    pub segment: String,
}

impl SourceSpec {
    pub fn income() -> Self {
        SourceSpec {
            input: PathBuf::from("income.csv"),
            output: PathBuf::from("income_data_by_tract.csv"),
            label: "Mean income (dollars)".to_string(),
            segment: "Households".to_string(),
        }
    }

    pub fn vehicle() -> Self {
        SourceSpec {
            input: PathBuf::from("private_vehicle.csv"),
            output: PathBuf::from("vehicle_data_by_tract.csv"),
            // Leading whitespace is part of the label in the export
            label: "    Private vehicle occupancy".to_string(),
            segment: "Total".to_string(),
        }
    }

    fn apply(&mut self, overlay: SourceOverlay) {
        if let Some(label) = overlay.label {
            self.label = label;
        }
        if let Some(segment) = overlay.segment {
            self.segment = segment;
        }
    }
}

/// `[income]` / `[vehicle]` table of the TOML file; file names are fixed
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceOverlay {
    label: Option<String>,
    segment: Option<String>,
}

/// Keys accepted in the TOML file, each one optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverlay {
    data_dir: Option<PathBuf>,
    county: Option<String>,
    state: Option<String>,
    tract_range: Option<TractRange>,
    income: Option<SourceOverlay>,
    vehicle: Option<SourceOverlay>,
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub county: String,
    pub state: String,
    pub tract_range: TractRange,
    pub income: SourceSpec,
    pub vehicle: SourceSpec,
    pub output: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_dir: PathBuf::from("."),
            county: "Hamilton County".to_string(),
            state: "Tennessee".to_string(),
            tract_range: TractRange::default(),
            income: SourceSpec::income(),
            vehicle: SourceSpec::vehicle(),
            output: PathBuf::from("heuristic_by_tract.csv"),
        }
    }
}

impl PipelineConfig {
    /// Load a TOML overlay; keys not present keep their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let overlay: ConfigOverlay =
            toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config = PipelineConfig::default();
        if let Some(dir) = overlay.data_dir {
            config.data_dir = dir;
        }
        if let Some(county) = overlay.county {
            config.county = county;
        }
        if let Some(state) = overlay.state {
            config.state = state;
        }
        if let Some(range) = overlay.tract_range {
            config.tract_range = range;
        }
        if let Some(income) = overlay.income {
            config.income.apply(income);
        }
        if let Some(vehicle) = overlay.vehicle {
            config.vehicle.apply(vehicle);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tract_range.validate()
    }

    pub fn pattern_for(&self, source: &SourceSpec) -> TractColumnPattern {
        TractColumnPattern::new(&self.county, &self.state, &source.segment)
    }

    pub fn resolve(&self, file: &Path) -> PathBuf {
        self.data_dir.join(file)
    }
}
