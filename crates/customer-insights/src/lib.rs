//! Customer Insights Library
//!
//! Fills gaps in customer datasets using the relationships between their
//! fields, then computes descriptive views over the cleaned data. Built on
//! Polars.
//!
//! # Overview
//!
//! - **Grouped imputation**: each field is filled from rows sharing a related
//!   key (gender by name, income by gender, age by income and so on), falling
//!   back to a global mean or mode
//! - **Data sources**: local CSV files or HTTP(S) URLs with tolerant parsing
//! - **Caching**: cleaned datasets are kept per source
//! - **Analyses**: age/income correlation, location views, frequency clusters,
//!   an income heatmap and distances between top buyers
//! - **Progress Reporting**: stage and per-field updates during processing
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use customer_insights::{AnalysisConfig, CustomerAnalyzer, DataSource, Pipeline};
//!
//! let df = DataSource::parse("clientes.csv").load()?;
//!
//! let pipeline = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//! let result = pipeline.process(&df)?;
//!
//! let cols = result.columns(&pipeline.config().columns)?;
//! let analyzer = CustomerAnalyzer::new(&cols, AnalysisConfig::default())?;
//! println!("Age/income correlation: {:?}", analyzer.correlation().global);
//! ```
//!
//! # Configuration
//!
//! Use [`ImputerConfig`] to map column names and choose how fields with no
//! known value are handled:
//!
//! ```rust,ignore
//! use customer_insights::{EmptyColumnPolicy, ImputerConfig};
//!
//! let config = ImputerConfig::builder()
//!     .max_passes(3)
//!     .empty_column_policy(EmptyColumnPolicy::Error)
//!     .build()?;
//! ```

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod imputers;
pub mod pipeline;
pub mod reporting;
pub mod source;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use analysis::{CustomerAnalyzer, LocationFilter, SegmentColumn};
pub use cache::DatasetCache;
pub use config::{
    AnalysisConfig, ColumnMapping, ConfigValidationError, EmptyColumnPolicy, ImputerConfig,
};
pub use error::{InsightsError, Result, ResultExt};
pub use imputers::CustomerImputer;
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use reporting::{ImputationReport, ReportGenerator};
pub use source::DataSource;
pub use types::{
    CustomerColumns, CustomerField, CustomerRecord, FieldSummary, FillSource,
    ImputationSummary, PipelineResult,
};
