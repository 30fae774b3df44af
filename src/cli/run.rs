use crate::config::parse::{read_config, validate_settings, ConfigError};
use crate::config::types::Config;
use crate::pipeline::{IngestStats, Pipeline, PipelineError};
use crate::report::{self, ReportError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("report error: {0}")]
    Report(#[from] ReportError),
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub chunk_size: Option<usize>,
    pub timezone: Option<String>,
}

impl Overrides {
    pub fn apply(self, config: &mut Config) {
        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = Some(chunk_size);
        }
        if let Some(timezone) = self.timezone {
            config.target_timezone = Some(timezone);
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rows: usize,
    pub stats: IngestStats,
    pub reports: Vec<PathBuf>,
}

pub fn run(config_path: Option<PathBuf>, overrides: Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => {
            info!(config_path = %path.display(), "Loading configuration");
            read_config(&path)?
        }
        None => match overrides.input.clone() {
            // An input on the command line is enough to run with defaults
            Some(input) => Config::for_input(input),
            None => {
                eprintln!("Error: config not found");
                eprintln!("Searched locations:");
                eprintln!("  ./logsift.yml");
                eprintln!("  ~/.config/logsift/config.yml");
                eprintln!("  /etc/logsift/config.yml");
                eprintln!("\nUse --config <path> to specify a config file, --input <path> to run with defaults, or run 'logsift config init' to generate one.");
                std::process::exit(1);
            }
        },
    };

    overrides.apply(&mut config);

    let summary = run_pipeline(&config)?;
    println!(
        "Analyzed {} rows ({} lines read), wrote {} reports to {}",
        summary.rows,
        summary.stats.lines_read,
        summary.reports.len(),
        config.output_dir.display()
    );
    Ok(())
}

/// Ingest, filter and report; no report file is written unless ingestion succeeds
pub fn run_pipeline(config: &Config) -> Result<RunSummary, RunError> {
    // Patterns, the exclusion filter and the zone are checked as the pipeline resolves them
    validate_settings(config)?;
    let pipeline = Pipeline::from_config(config)?;
    info!(
        input = %config.input.display(),
        format = %pipeline.pattern().name(),
        "Pipeline configured"
    );

    let outcome = pipeline.run()?;
    info!(rows = outcome.dataset.len(), "Data loaded");

    let reports = if config.reports.enabled {
        if outcome.dataset.is_empty() {
            warn!("Dataset is empty, reports will only contain headers");
        }
        let built = report::build_all(&outcome.dataset, &config.reports);
        report::write_all(&config.output_dir, &built)?
    } else {
        info!("Reports disabled");
        Vec::new()
    };

    Ok(RunSummary {
        rows: outcome.dataset.len(),
        stats: outcome.stats,
        reports,
    })
}
