//! Main customer pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating loading, schema validation and imputation of a customer
//! dataset.

use crate::config::{ConfigValidationError, ImputerConfig};
use crate::error::Result;
use crate::imputers::CustomerImputer;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::source::DataSource;
use crate::types::{CustomerColumns, CustomerField, PipelineResult};
use polars::prelude::*;
use std::sync::Arc;
use tracing::{error, info};

/// The main customer pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use customer_insights::{ImputerConfig, Pipeline};
///
/// let result = Pipeline::builder()
///     .config(ImputerConfig::builder().max_passes(3).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(&dataframe)?;
///
/// println!("Filled {} cells", result.summary.cells_filled());
/// ```
pub struct Pipeline {
    imputer: CustomerImputer,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Pipelines are handed to the dataset cache, which may be used across threads
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The imputer configuration this pipeline runs with.
    pub fn config(&self) -> &ImputerConfig {
        self.imputer.config()
    }

    /// Process a DataFrame through the pipeline.
    ///
    /// The input frame is not modified. Returns the imputed frame together
    /// with an [`ImputationSummary`](crate::ImputationSummary).
    pub fn process(&self, df: &DataFrame) -> Result<PipelineResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Filled {} values in {} rows",
                    result.summary.cells_filled(),
                    result.summary.rows
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Load `source` and process it.
    ///
    /// Reports the [`PipelineStage::Loading`] stage before validation and
    /// imputation. A load failure is reported as [`PipelineStage::Failed`].
    pub fn run(&self, source: &DataSource) -> Result<PipelineResult> {
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Reading {}", source),
        ));

        let df = match source.load() {
            Ok(df) => df,
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Failed to load {}: {}", source, e);
                return Err(e);
            }
        };

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} rows", df.height()),
        ));
        self.process(&df)
    }

    /// Report progress if a reporter is configured.
    pub(crate) fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, df: &DataFrame) -> Result<PipelineResult> {
        info!(
            "Starting customer pipeline on {} rows x {} columns",
            df.height(),
            df.width()
        );

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Validation,
            0.0,
            "Checking mapped columns...",
        ));
        if df.height() > 0 {
            CustomerColumns::validate_schema(df, &self.config().columns)?;
        }
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Validation,
            1.0,
            "Schema validated",
        ));

        let columns = &self.config().columns;
        let fields_per_pass = CustomerField::ALL.len();
        let total = fields_per_pass * self.config().max_passes;
        let mut step = 0;
        let mut on_field = |pass: usize, field: CustomerField| {
            let column = field.column_name(columns);
            self.report_progress(ProgressUpdate::with_items(
                PipelineStage::Imputation,
                format!("Pass {}: {}", pass, column),
                step,
                total,
                format!("Imputing {}", field.display_name()),
            ));
            step += 1;
        };

        let (data, summary) = self.imputer.impute_with_summary(df, &mut on_field)?;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Imputation,
            1.0,
            "Imputation complete",
        ));

        info!(
            "Pipeline finished in {}ms: completeness {:.1}% -> {:.1}%",
            summary.duration_ms,
            summary.completeness_before * 100.0,
            summary.completeness_after * 100.0
        );

        Ok(PipelineResult { data, summary })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<ImputerConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the imputer configuration.
    pub fn config(mut self, config: ImputerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use customer_insights::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StderrReporter;
    ///
    /// impl ProgressReporter for StderrReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         eprintln!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(StderrReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            imputer: CustomerImputer::new(config),
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnMapping, EmptyColumnPolicy};
    use crate::error::InsightsError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn customers() -> DataFrame {
        df![
            "Nombre" => [Some("Ana"), Some("Luis"), None],
            "Género" => [Some("F"), Some("M"), Some("F")],
            "Ingreso_Anual_USD" => [Some(40000.0), None, Some(60000.0)],
            "Edad" => [Some(30.0), Some(41.0), None],
            "Frecuencia_Compra" => [Some("Alta"), Some("Baja"), Some("Alta")],
            "Historial_Compras" => [Some(12.0), Some(3.0), Some(12.0)],
            "Latitud" => [Some(4.6), Some(6.2), None],
            "Longitud" => [Some(-74.1), Some(-75.5), Some(-74.0)],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().max_passes, 2);
        assert!(pipeline.progress_reporter.is_none());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = ImputerConfig {
            max_passes: 0,
            ..ImputerConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_pipeline_builder_with_progress_callback() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |_update| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        pipeline.report_progress(ProgressUpdate::new(PipelineStage::Imputation, 0.5, "Test"));

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_process_fills_everything() {
        let pipeline = Pipeline::builder().build().unwrap();
        let input = customers();
        let result = pipeline.process(&input).unwrap();

        assert_eq!(result.summary.missing_after, 0);
        assert_eq!(result.summary.missing_before, 4);
        assert_eq!(result.data.height(), 3);
        // Input is untouched
        assert_eq!(input.column("Nombre").unwrap().null_count(), 1);

        let cols = result.columns(&ColumnMapping::default()).unwrap();
        assert_eq!(cols.annual_income[1], Some(50000.0));
        assert_eq!(cols.latitude[2], Some(4.6));
    }

    #[test]
    fn test_process_reports_stages_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| sink.lock().push(update.stage))
            .build()
            .unwrap();
        pipeline.process(&customers()).unwrap();

        let seen = stages.lock();
        assert_eq!(seen.first(), Some(&PipelineStage::Validation));
        assert_eq!(seen.last(), Some(&PipelineStage::Complete));
        let imputation_updates = seen
            .iter()
            .filter(|s| **s == PipelineStage::Imputation)
            .count();
        // One update per field for the single pass, plus the closing update
        assert_eq!(imputation_updates, CustomerField::ALL.len() + 1);
    }

    #[test]
    fn test_process_reports_failure() {
        let last = Arc::new(Mutex::new(None));
        let sink = last.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| *sink.lock() = Some(update.stage))
            .build()
            .unwrap();

        let df = df!["Nombre" => ["Ana"]].unwrap();
        let err = pipeline.process(&df).unwrap_err();

        assert!(matches!(err, InsightsError::ColumnNotFound(_)));
        assert_eq!(*last.lock(), Some(PipelineStage::Failed));
    }

    #[test]
    fn test_run_reports_loading_and_reaches_full_progress() {
        let path = std::env::temp_dir().join(format!(
            "customer_insights_run_{}.csv",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "Nombre,Género,Ingreso_Anual_USD,Edad,Frecuencia_Compra,Historial_Compras,Latitud,Longitud\n\
             Ana,F,40000,30,Alta,12,4.6,-74.1\n\
             Luis,M,,41,Baja,3,6.2,-75.5\n",
        )
        .unwrap();

        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let pipeline = Pipeline::builder()
            .on_progress(move |update| sink.lock().push(update))
            .build()
            .unwrap();

        let result = pipeline.run(&DataSource::File(path.clone()));
        std::fs::remove_file(&path).ok();
        assert_eq!(result.unwrap().summary.missing_after, 0);

        let updates = updates.lock();
        assert_eq!(updates.first().map(|u| u.stage), Some(PipelineStage::Loading));
        assert!(updates.windows(2).all(|w| w[0].progress <= w[1].progress));
        // The last working stage ends where Complete begins
        let before_complete = &updates[updates.len() - 2];
        assert_eq!(before_complete.stage, PipelineStage::Imputation);
        assert!((before_complete.progress - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_run_reports_load_failure() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();
        let pipeline = Pipeline::builder()
            .on_progress(move |update| sink.lock().push(update.stage))
            .build()
            .unwrap();

        let err = pipeline
            .run(&DataSource::File("does/not/exist.csv".into()))
            .unwrap_err();

        assert_eq!(err.error_code(), "SOURCE_UNAVAILABLE");
        assert_eq!(
            *stages.lock(),
            vec![PipelineStage::Loading, PipelineStage::Failed]
        );
    }

    #[test]
    fn test_process_strict_policy_propagates() {
        let config = ImputerConfig::builder()
            .empty_column_policy(EmptyColumnPolicy::Error)
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();

        let mut df = customers();
        let empty: Vec<Option<f64>> = vec![None; 3];
        df.replace("Latitud", Series::new("Latitud".into(), &empty))
            .unwrap();

        let err = pipeline.process(&df).unwrap_err();
        assert_eq!(err.error_code(), "NO_VALID_VALUES");
    }
}
