use crate::config::ImputerConfig;
use crate::error::Result;
use crate::types::{ImputationSummary, PipelineResult};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Machine-readable record of one imputation run.
///
/// Used both for `--json` output and for the `<name>_report.json` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Where the dataset was read from
    pub source: String,
    /// Path to the cleaned CSV, if one was written
    pub output_file: Option<String>,
    /// Shape of the cleaned dataset (rows, columns)
    pub shape: (usize, usize),
    /// Configuration the imputer ran with
    pub config: ImputerConfig,
    /// What the imputer did
    pub summary: ImputationSummary,
}

/// Writes cleaned datasets and reports to an output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: String,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            output_name: "customers_cleaned".to_string(),
        }
    }
}

impl ReportGenerator {
    /// Create a generator writing `<output_name>.csv` and
    /// `<output_name>_report.json` under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, output_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            output_name: output_name.into(),
        }
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.output_name))
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_report.json", self.output_name))
    }

    /// Write the cleaned dataset as CSV. Returns the file path.
    pub fn write_cleaned_csv(&self, df: &DataFrame) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.csv_path();
        let mut file = File::create(&path)?;

        let mut out = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut out)?;

        info!("Dataset saved: {}", path.display());
        Ok(path)
    }

    /// Assemble a report for a finished run without writing it.
    pub fn build_report(
        source: &str,
        output_file: Option<&str>,
        config: &ImputerConfig,
        result: &PipelineResult,
    ) -> ImputationReport {
        ImputationReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: source.to_string(),
            output_file: output_file.map(str::to_string),
            shape: result.data.shape(),
            config: config.clone(),
            summary: result.summary.clone(),
        }
    }

    /// Write a report as pretty-printed JSON. Returns the file path.
    pub fn write_report(&self, report: &ImputationReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.report_path();
        let mut file = File::create(&path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", path.display());
        Ok(path)
    }
}
