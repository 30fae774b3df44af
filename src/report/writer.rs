use super::Report;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Write one report as `<output_dir>/<name>.csv` with a header row
pub fn write_report(output_dir: &Path, report: &Report) -> Result<PathBuf, ReportError> {
    let path = output_dir.join(report.file_name());
    let csv_err = |source: csv::Error| ReportError::Csv {
        path: path.clone(),
        source,
    };

    let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
    writer.write_record(&report.headers).map_err(csv_err)?;
    for row in &report.rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|e| csv_err(csv::Error::from(e)))?;

    info!(report = report.name, rows = report.len(), path = %path.display(), "Saved report");
    Ok(path)
}

/// Create the output directory and write every report into it
pub fn write_all(output_dir: &Path, reports: &[Report]) -> Result<Vec<PathBuf>, ReportError> {
    fs::create_dir_all(output_dir).map_err(|source| ReportError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    reports
        .iter()
        .map(|report| write_report(output_dir, report))
        .collect()
}
