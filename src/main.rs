use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tract_heuristic::{run, PipelineConfig, TractRange};

/// Per-tract priority heuristic from census income and vehicle-occupancy exports
#[derive(Parser, Debug)]
#[command(name = "tract-heuristic")]
#[command(version)]
struct Args {
    /// Directory holding income.csv and private_vehicle.csv; outputs land here too
    #[arg(short, long, env = "TRACT_HEURISTIC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Optional TOML file overriding the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// County name as it appears in the tract column headers
    #[arg(long)]
    county: Option<String>,

    /// State name as it appears in the tract column headers
    #[arg(long)]
    state: Option<String>,

    /// First tract number kept (inclusive)
    #[arg(long)]
    first_tract: Option<u32>,

    /// Last tract number kept (inclusive)
    #[arg(long)]
    last_tract: Option<u32>,
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(county) = self.county {
            config.county = county;
        }
        if let Some(state) = self.state {
            config.state = state;
        }
        config.tract_range = TractRange::new(
            self.first_tract.unwrap_or(config.tract_range.start),
            self.last_tract.unwrap_or(config.tract_range.end),
        )?;

        Ok(config)
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;
    info!(
        "tract-heuristic {}: {} {}, tracts {}..={}",
        tract_heuristic::VERSION,
        config.county,
        config.state,
        config.tract_range.start,
        config.tract_range.end
    );

    let report = run(&config).context("Pipeline aborted")?;
    info!("{}", report.summary());
    info!("wrote {}", report.output.display());

    Ok(())
}
