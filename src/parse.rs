// 🔢 Cell Parsers
// Locale-formatted census strings → numbers

use crate::error::{PipelineError, Result, ValueKind};

fn parse_error(kind: ValueKind, tract: &str, value: &str) -> PipelineError {
    PipelineError::Parse {
        kind,
        tract: tract.to_string(),
        value: value.to_string(),
    }
}

/// "45,000" → 45000
pub fn parse_income(tract: &str, value: &str) -> Result<i64> {
    value
        .replace(',', "")
        .trim()
        .parse::<i64>()
        .map_err(|_| parse_error(ValueKind::Income, tract, value))
}

/// "87.3%" → 87.3
pub fn parse_percent(tract: &str, value: &str) -> Result<f64> {
    let parsed = value
        .replace('%', "")
        .trim()
        .parse::<f64>()
        .map_err(|_| parse_error(ValueKind::Percent, tract, value))?;

    // f64::from_str accepts "NaN" and "inf"
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(parse_error(ValueKind::Percent, tract, value))
    }
}

/// Parse a whole extracted row, pairing each value with its tract label
pub fn parse_row<T>(
    tracts: &[String],
    values: &[String],
    parse: impl Fn(&str, &str) -> Result<T>,
) -> Result<Vec<T>> {
    tracts
        .iter()
        .zip(values)
        .map(|(tract, value)| parse(tract.as_str(), value.as_str()))
        .collect()
}
