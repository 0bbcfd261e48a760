// 🚚 Pipeline Runner
// income extractor → vehicle extractor → combiner, in that order

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extractor::run_extractor;
use crate::heuristic::{combine, write_scores, TractScore};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub income_output: PathBuf,
    pub vehicle_output: PathBuf,
    pub output: PathBuf,
    pub tracts: usize,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl PipelineReport {
    fn new(config: &PipelineConfig, scores: &[TractScore]) -> Self {
        let finite = scores.iter().map(|s| s.heuristic).filter(|h| h.is_finite());
        PipelineReport {
            income_output: config.resolve(&config.income.output),
            vehicle_output: config.resolve(&config.vehicle.output),
            output: config.resolve(&config.output),
            tracts: scores.len(),
            min_score: finite.clone().reduce(f64::min),
            max_score: finite.reduce(f64::max),
        }
    }

    pub fn summary(&self) -> String {
        match (self.min_score, self.max_score) {
            (Some(min), Some(max)) => format!(
                "{} tracts scored, heuristic range [{:.4}, {:.4}]",
                self.tracts, min, max
            ),
            _ => format!("{} tracts scored, no finite heuristic", self.tracts),
        }
    }
}

/// Raw score array as printed to the console
pub fn score_array(scores: &[TractScore]) -> Result<String> {
    let values: Vec<f64> = scores.iter().map(|s| s.heuristic).collect();
    // serde_json writes non-finite floats as null
    Ok(serde_json::to_string(&values)?)
}

/// Run all three stages; the output file is only written when every check passes
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;

    info!("stage 1/3: income");
    run_extractor(&config.income, config)?;

    info!("stage 2/3: vehicle");
    run_extractor(&config.vehicle, config)?;

    info!("stage 3/3: heuristic");
    let scores = combine(
        &config.resolve(&config.income.output),
        &config.resolve(&config.vehicle.output),
    )?;
    write_scores(&scores, &config.resolve(&config.output))?;

    println!("{}", score_array(&scores)?);

    Ok(PipelineReport::new(config, &scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TractColumnPattern, TractRange};
    use crate::error::PipelineError;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn header(segment: &str, n: u32) -> String {
        TractColumnPattern::new("Hamilton County", "Tennessee", segment).column_name(n)
    }

    fn write_csv(path: &Path, rows: &[Vec<String>]) {
        let mut writer = csv::Writer::from_path(path).unwrap();
        for row in rows {
            writer.write_record(row).unwrap();
        }
        writer.flush().unwrap();
    }

    /// Census-style exports with tracts 3..=6 plus a margin-of-error column
    fn seed_inputs(dir: &Path, income_label: &str) {
        let mut income_headers = vec!["Label (Grouping)".to_string()];
        let mut vehicle_headers = vec!["Label (Grouping)".to_string()];
        for n in 3..=6 {
            income_headers.push(header("Households", n));
            vehicle_headers.push(header("Total", n));
        }
        income_headers.push(
            "Census Tract 4, Hamilton County, Tennessee!!Households!!Margin of Error".to_string(),
        );

        let row = |cells: &[&str]| cells.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        write_csv(
            &dir.join("income.csv"),
            &[
                income_headers,
                row(&["Total households", "1,000", "1,100", "1,200", "1,300", "±50"]),
                row(&[income_label, "99,999", "45,000", "30,000", "61,250", "±4,000"]),
            ],
        );
        write_csv(
            &dir.join("private_vehicle.csv"),
            &[
                vehicle_headers,
                row(&["Workers 16 years and over", "1", "2", "3", "4"]),
                row(&["    Private vehicle occupancy", "1.0%", "90.0%", "10.0%", "75.5%"]),
            ],
        );
    }

    fn config_for(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            data_dir: dir.to_path_buf(),
            tract_range: TractRange::new(4, 124).unwrap(),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_full_run_writes_all_three_files() {
        let dir = tempdir().unwrap();
        seed_inputs(dir.path(), "Mean income (dollars)");
        let config = config_for(dir.path());

        let report = run(&config).unwrap();
        assert_eq!(report.tracts, 3);

        let income = fs::read_to_string(dir.path().join("income_data_by_tract.csv")).unwrap();
        let mut lines = income.lines();
        assert_eq!(
            lines.next().unwrap(),
            format!(
                "{},{},{}",
                header("Households", 4),
                header("Households", 5),
                header("Households", 6)
            )
        );
        assert_eq!(lines.next().unwrap(), "\"45,000\",\"30,000\",\"61,250\"");
        assert_eq!(lines.next(), None);

        let mut reader = csv::Reader::from_path(dir.path().join("heuristic_by_tract.csv")).unwrap();
        let scores: Vec<TractScore> = reader.deserialize().map(|r| r.unwrap()).collect();
        let tracts: Vec<_> = scores.iter().map(|s| s.tract.clone()).collect();
        assert_eq!(
            tracts,
            vec![header("Households", 4), header("Households", 5), header("Households", 6)]
        );
        // Tract 5: lowest income and lowest vehicle occupancy
        assert!(scores[1].heuristic > scores[0].heuristic);
        assert!(scores[1].heuristic > scores[2].heuristic);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = tempdir().unwrap();
        seed_inputs(dir.path(), "Mean income (dollars)");
        let config = config_for(dir.path());
        let out = dir.path().join("heuristic_by_tract.csv");

        run(&config).unwrap();
        let first = fs::read(&out).unwrap();
        run(&config).unwrap();
        assert_eq!(fs::read(&out).unwrap(), first);
    }

    #[test]
    fn test_missing_label_aborts_before_output() {
        let dir = tempdir().unwrap();
        seed_inputs(dir.path(), "Median income (dollars)");
        let config = config_for(dir.path());

        let result = run(&config);

        // Header-only income vs one-row vehicle
        assert!(matches!(
            result,
            Err(PipelineError::ShapeMismatch { income: (0, 3), vehicle: (1, 3) })
        ));
        let income = fs::read_to_string(dir.path().join("income_data_by_tract.csv")).unwrap();
        assert_eq!(income.lines().count(), 1);
        assert!(!dir.path().join("heuristic_by_tract.csv").exists());
    }

    #[test]
    fn test_missing_input_file_aborts() {
        let dir = tempdir().unwrap();
        let result = run(&config_for(dir.path()));
        assert!(matches!(result, Err(PipelineError::Io { .. })));
        assert!(!dir.path().join("heuristic_by_tract.csv").exists());
    }

    #[test]
    fn test_narrow_range_limits_tracts() {
        let dir = tempdir().unwrap();
        seed_inputs(dir.path(), "Mean income (dollars)");
        let config = PipelineConfig {
            tract_range: TractRange::new(5, 5).unwrap(),
            ..config_for(dir.path())
        };

        let report = run(&config).unwrap();
        assert_eq!(report.tracts, 1);
        // Single tract: normalized value is 1, inverted 0
        assert_eq!(report.max_score, Some(0.0));
    }

    #[test]
    fn test_score_array_formats_nan_as_null() {
        let scores = vec![
            TractScore { tract: "a".to_string(), heuristic: 0.25 },
            TractScore { tract: "b".to_string(), heuristic: f64::NAN },
        ];
        assert_eq!(score_array(&scores).unwrap(), "[0.25,null]");
    }

    #[test]
    fn test_report_summary() {
        let config = PipelineConfig::default();
        let scores = vec![
            TractScore { tract: "a".to_string(), heuristic: 0.1 },
            TractScore { tract: "b".to_string(), heuristic: 0.6 },
        ];
        let report = PipelineReport::new(&config, &scores);
        assert_eq!(report.summary(), "2 tracts scored, heuristic range [0.1000, 0.6000]");
    }
}
