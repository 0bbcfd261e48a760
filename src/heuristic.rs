// 🎯 Heuristic Combiner - stage 3
// income + vehicle intermediates → normalized, inverted, blended score per tract

use crate::config::TractColumnPattern;
use crate::error::{PipelineError, Result};
use crate::extractor::ExtractedTable;
use crate::parse::{parse_income, parse_percent, parse_row};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

pub const INCOME_WEIGHT: f64 = 0.5;
pub const VEHICLE_WEIGHT: f64 = 0.5;

/// One output row; higher heuristic = higher assumed need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TractScore {
    pub tract: String,
    pub heuristic: f64,
}

// ============================================================================
// VECTOR MATH
// ============================================================================

pub fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Divide every element by the Euclidean norm
///
/// A zero vector produces NaN elements; they propagate into the output.
pub fn l2_normalize(values: &[f64]) -> Vec<f64> {
    let norm = l2_norm(values);
    if norm == 0.0 {
        warn!("zero-norm vector of length {}; scores will be NaN", values.len());
    }
    values.iter().map(|v| v / norm).collect()
}

pub fn invert(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| 1.0 - v).collect()
}

pub fn blend(income: &[f64], vehicle: &[f64]) -> Vec<f64> {
    income
        .iter()
        .zip(vehicle)
        .map(|(i, v)| INCOME_WEIGHT * i + VEHICLE_WEIGHT * v)
        .collect()
}

/// normalize → invert → blend
pub fn score(income: &[i64], vehicle: &[f64]) -> Vec<f64> {
    let income: Vec<f64> = income.iter().map(|&i| i as f64).collect();
    let income_inverted = invert(&l2_normalize(&income));
    let vehicle_inverted = invert(&l2_normalize(vehicle));
    blend(&income_inverted, &vehicle_inverted)
}

// ============================================================================
// COMBINER
// ============================================================================

/// Exactly one data row, or the matching error
fn single_row<'a>(table: &'a ExtractedTable, path: &Path) -> Result<&'a [String]> {
    match table.rows.as_slice() {
        [row] => Ok(row.as_slice()),
        [] => Err(PipelineError::MissingLabel {
            path: path.to_path_buf(),
        }),
        rows => Err(PipelineError::AmbiguousRows {
            path: path.to_path_buf(),
            rows: rows.len(),
        }),
    }
}

/// Columns are paired by position; the tract part of each header must agree
fn check_tract_alignment(income: &ExtractedTable, vehicle: &ExtractedTable) -> Result<()> {
    for (position, (i, v)) in income.headers.iter().zip(&vehicle.headers).enumerate() {
        let income_tract = TractColumnPattern::geography(i);
        let vehicle_tract = TractColumnPattern::geography(v);
        if income_tract != vehicle_tract {
            return Err(PipelineError::TractMismatch {
                position,
                income: income_tract.to_string(),
                vehicle: vehicle_tract.to_string(),
            });
        }
    }
    Ok(())
}

/// Score already-loaded intermediates
pub fn combine_tables(
    income: &ExtractedTable,
    income_path: &Path,
    vehicle: &ExtractedTable,
    vehicle_path: &Path,
) -> Result<Vec<TractScore>> {
    if income.shape() != vehicle.shape() {
        return Err(PipelineError::ShapeMismatch {
            income: income.shape(),
            vehicle: vehicle.shape(),
        });
    }

    let income_row = single_row(income, income_path)?;
    let vehicle_row = single_row(vehicle, vehicle_path)?;
    check_tract_alignment(income, vehicle)?;

    // Output identifiers are the income headers, in order
    let tracts = &income.headers;
    let income_values = parse_row(tracts, income_row, parse_income)?;
    let vehicle_values = parse_row(tracts, vehicle_row, parse_percent)?;
    debug!("parsed {} tracts", tracts.len());

    let scores = score(&income_values, &vehicle_values);

    Ok(tracts
        .iter()
        .zip(scores)
        .map(|(tract, heuristic)| TractScore {
            tract: tract.clone(),
            heuristic,
        })
        .collect())
}

/// Read both intermediates and score them
pub fn combine(income_path: &Path, vehicle_path: &Path) -> Result<Vec<TractScore>> {
    info!(
        "combining {} and {}",
        income_path.display(),
        vehicle_path.display()
    );
    let income = ExtractedTable::read(income_path)?;
    let vehicle = ExtractedTable::read(vehicle_path)?;
    combine_tables(&income, income_path, &vehicle, vehicle_path)
}

/// Write `tract,heuristic` rows
pub fn write_scores(scores: &[TractScore], path: &Path) -> Result<()> {
    let csv_err = |source| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut writer = csv::Writer::from_writer(file);
    for s in scores {
        writer.serialize(s).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("wrote {} scores to {}", scores.len(), path.display());
    Ok(())
}
