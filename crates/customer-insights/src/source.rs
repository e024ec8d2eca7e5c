//! Customer dataset sources.
//!
//! A dataset is read from a local CSV file or, with the `remote` feature,
//! from an HTTP(S) URL. CSV parsing tries several reader strategies before
//! giving up, since exported spreadsheets often carry doubled quotes or
//! blank trailing lines.

use crate::error::{InsightsError, Result, ResultExt};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a customer dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "location")]
pub enum DataSource {
    /// A CSV file on the local filesystem
    File(PathBuf),
    /// A CSV document served over HTTP(S)
    Url(String),
}

impl DataSource {
    /// Interpret a user-supplied location.
    ///
    /// Strings starting with `http://` or `https://` are URLs, anything
    /// else is a file path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    /// Stable key identifying this source, used by the dataset cache.
    pub fn identity(&self) -> String {
        match self {
            Self::File(path) => format!("file:{}", path.display()),
            Self::Url(url) => format!("url:{}", url),
        }
    }

    /// Short name suitable for output files (file stem or last URL segment).
    pub fn stem(&self) -> String {
        let raw = match self {
            Self::File(path) => path.file_stem().and_then(|s| s.to_str()).map(str::to_string),
            Self::Url(url) => url
                .split(['?', '#'])
                .next()
                .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
                .and_then(|segment| Path::new(segment).file_stem())
                .and_then(|s| s.to_str())
                .map(str::to_string),
        };
        raw.filter(|s| !s.is_empty())
            .unwrap_or_else(|| "customers".to_string())
    }

    /// Read the dataset into a DataFrame.
    ///
    /// # Errors
    ///
    /// Returns [`InsightsError::SourceUnavailable`] when the file does not
    /// exist or the URL cannot be fetched, and [`InsightsError::Polars`]
    /// when every CSV strategy fails.
    pub fn load(&self) -> Result<DataFrame> {
        info!("Loading dataset from: {}", self);
        let df = match self {
            Self::File(path) => load_csv_file(path)?,
            Self::Url(url) => load_csv_url(url)?,
        };
        info!("Dataset loaded successfully: {:?}", df.shape());
        Ok(df)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

fn quoted_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
}

fn plain_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
}

/// Load a CSV file, falling back to progressively looser strategies.
fn load_csv_file(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(InsightsError::SourceUnavailable(format!(
            "file not found: {}",
            path.display()
        )));
    }

    match quoted_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    match plain_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading without quotes failed: {}", e),
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| InsightsError::from(e).with_context(format!("Reading {}", path.display())))?;
    load_cleaned(&content)
}

/// Parse CSV text already held in memory with the same strategies.
pub fn read_csv_text(content: &str) -> Result<DataFrame> {
    let bytes = content.as_bytes().to_vec();

    match quoted_options()
        .into_reader_with_file_handle(Cursor::new(bytes.clone()))
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard parsing failed: {}", e),
    }

    match plain_options()
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Parsing without quotes failed: {}", e),
    }

    load_cleaned(content)
}

fn load_cleaned(content: &str) -> Result<DataFrame> {
    let cleaned = clean_csv_content(content);
    plain_options()
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .context("Parsing cleaned CSV content")
}

#[cfg(feature = "remote")]
fn load_csv_url(url: &str) -> Result<DataFrame> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| InsightsError::SourceUnavailable(format!("{}: {}", url, e)))?;
    let body = response.text()?;
    debug!("Fetched {} bytes from {}", body.len(), url);
    read_csv_text(&body)
}

#[cfg(not(feature = "remote"))]
fn load_csv_url(url: &str) -> Result<DataFrame> {
    Err(InsightsError::SourceUnavailable(format!(
        "{}: URL sources require the `remote` feature",
        url
    )))
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_csv(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "customer_insights_{}_{}.csv",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_detects_urls() {
        assert_eq!(
            DataSource::parse("https://example.com/data.csv"),
            DataSource::Url("https://example.com/data.csv".to_string())
        );
        assert_eq!(
            DataSource::parse("HTTP://host/x.csv"),
            DataSource::Url("HTTP://host/x.csv".to_string())
        );
        assert_eq!(
            DataSource::parse(" data/customers.csv "),
            DataSource::File(PathBuf::from("data/customers.csv"))
        );
    }

    #[test]
    fn test_identity_distinguishes_kinds() {
        let file = DataSource::File(PathBuf::from("a.csv"));
        let url = DataSource::Url("a.csv".to_string());
        assert_ne!(file.identity(), url.identity());
        assert_eq!(file.identity(), DataSource::parse("a.csv").identity());
    }

    #[test]
    fn test_stem() {
        assert_eq!(DataSource::parse("/tmp/clientes.csv").stem(), "clientes");
        assert_eq!(
            DataSource::parse("https://host/files/ventas.csv?raw=1").stem(),
            "ventas"
        );
        assert_eq!(DataSource::parse("https://host/").stem(), "host");
    }

    #[test]
    fn test_load_missing_file_is_unavailable() {
        let source = DataSource::File(PathBuf::from("/definitely/not/here.csv"));
        let err = source.load().unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_UNAVAILABLE");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_load_file() {
        let path = temp_csv(
            "load",
            "Nombre,Edad,Latitud\nAna,30,4.6\n,41,\nLuis,,6.2\n",
        );
        let df = DataSource::File(path.clone()).load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.column("Nombre").unwrap().null_count(), 1);
        assert_eq!(df.column("Edad").unwrap().null_count(), 1);
    }

    #[test]
    fn test_read_csv_text() {
        let df = read_csv_text("Nombre,Género\nAna,F\nLuis,M\n").unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert!(df.column("Género").is_ok());
    }

    #[test]
    fn test_clean_csv_content() {
        let raw = "a,b\n\n\"\"x\"\",1\n   \n";
        assert_eq!(clean_csv_content(raw), "a,b\n\"x\",1");
    }
}
