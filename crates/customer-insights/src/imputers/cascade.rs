//! The customer fill cascade.
//!
//! Each field is filled from the most specific relationship available and
//! falls back to a global statistic, then to the configured placeholder:
//!
//! | Field              | Grouped by         | Aggregate | Fallback    |
//! |--------------------|--------------------|-----------|-------------|
//! | Name               | (none)             | mode      | global mode |
//! | Gender             | Name               | mode      | global mode |
//! | Annual income      | Gender             | mean      | global mean |
//! | Age                | Annual income      | mean      | global mean |
//! | Purchase frequency | Purchase history   | mode      | global mode |
//! | Purchase history   | Purchase frequency | mean      | global mean |
//! | Latitude           | Gender             | mean      | global mean |
//! | Longitude          | Gender             | mean      | global mean |
//!
//! Fields are processed in that order within a pass. Global means are taken
//! over the values known before the grouped step of the same field; global
//! modes over the values known after it. Mode ties resolve to the
//! lexicographically smallest value.

use super::grouped::{
    NumericKey, fill_constant, fill_from_groups, group_means, group_modes, known_labels,
    known_numbers, numeric_keys, text_keys,
};
use crate::config::{EmptyColumnPolicy, ImputerConfig};
use crate::error::{InsightsError, Result};
use crate::types::{CustomerColumns, CustomerField, FieldSummary, FillSource, ImputationSummary};
use crate::utils::{mean_of, mode_of};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fills missing customer fields with the grouped cascade.
///
/// The imputer never modifies its input; it returns a new frame.
///
/// # Example
///
/// ```rust,ignore
/// use customer_insights::{CustomerImputer, ImputerConfig};
///
/// let imputer = CustomerImputer::new(ImputerConfig::default());
/// let cleaned = imputer.impute(&raw_df)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CustomerImputer {
    config: ImputerConfig,
}

impl CustomerImputer {
    pub fn new(config: ImputerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImputerConfig {
        &self.config
    }

    /// Impute all mapped fields of `df`, returning the filled frame.
    pub fn impute(&self, df: &DataFrame) -> Result<DataFrame> {
        self.impute_with_summary(df, &mut |_, _| {})
            .map(|(out, _)| out)
    }

    /// Impute all mapped fields of `df` and report what was filled.
    ///
    /// `on_field` is called with the pass number (starting at 1) and the
    /// field before each field is processed.
    ///
    /// A frame with zero rows is returned as-is without schema validation
    /// or aggregation.
    pub fn impute_with_summary(
        &self,
        df: &DataFrame,
        on_field: &mut dyn FnMut(usize, CustomerField),
    ) -> Result<(DataFrame, ImputationSummary)> {
        let start = Instant::now();

        if df.height() == 0 {
            info!("Dataset is empty, skipping imputation");
            return Ok((df.clone(), ImputationSummary::new()));
        }

        let columns = &self.config.columns;
        let mut cols = CustomerColumns::from_frame(df, columns)?;
        let mut summary = self.impute_columns(&mut cols, on_field)?;

        let mut out = df.clone();
        cols.write_into(&mut out, columns)?;

        summary.duration_ms = start.elapsed().as_millis() as u64;
        Ok((out, summary))
    }

    /// Run the cascade over an extracted column set.
    ///
    /// Passes repeat until no value is missing or `max_passes` is reached.
    ///
    /// # Errors
    ///
    /// - [`InsightsError::NoValidValues`] when a field has no known value and
    ///   the policy is [`EmptyColumnPolicy::Error`]
    /// - [`InsightsError::ImputationFailed`] if values remain missing after
    ///   the last pass
    pub fn impute_columns(
        &self,
        cols: &mut CustomerColumns,
        on_field: &mut dyn FnMut(usize, CustomerField),
    ) -> Result<ImputationSummary> {
        let mut summary = ImputationSummary::new();
        summary.rows = cols.len();
        summary.missing_before = cols.missing_count();
        summary.completeness_before =
            ImputationSummary::completeness(summary.rows, summary.missing_before);
        summary.fields = CustomerField::ALL
            .iter()
            .map(|f| {
                FieldSummary::new(
                    *f,
                    f.column_name(&self.config.columns),
                    cols.missing_in(*f),
                )
            })
            .collect();

        if cols.is_empty() {
            return Ok(summary);
        }

        info!(
            "Imputing {} missing values across {} rows",
            summary.missing_before, summary.rows
        );

        while summary.passes < self.config.max_passes && cols.missing_count() > 0 {
            summary.passes += 1;
            debug!("Starting imputation pass {}", summary.passes);
            self.run_pass(cols, &mut summary, on_field)?;
        }

        summary.missing_after = cols.missing_count();
        summary.completeness_after =
            ImputationSummary::completeness(summary.rows, summary.missing_after);

        if summary.missing_after > 0 {
            let field = CustomerField::ALL
                .into_iter()
                .find(|f| cols.missing_in(*f) > 0)
                .unwrap_or(CustomerField::Name);
            return Err(InsightsError::ImputationFailed {
                column: field.column_name(&self.config.columns).to_string(),
                reason: format!(
                    "{} values still missing after {} passes",
                    summary.missing_after, summary.passes
                ),
            });
        }

        info!(
            "Imputation converged after {} pass(es), {} values filled",
            summary.passes,
            summary.cells_filled()
        );
        Ok(summary)
    }

    fn run_pass(
        &self,
        cols: &mut CustomerColumns,
        summary: &mut ImputationSummary,
        on_field: &mut dyn FnMut(usize, CustomerField),
    ) -> Result<()> {
        let pass = summary.passes;
        for field in CustomerField::ALL {
            on_field(pass, field);
            match field {
                CustomerField::Name => {
                    self.fill_mode_global(field, &mut cols.name, summary)?;
                }
                CustomerField::Gender => {
                    let keys = text_keys(&cols.name);
                    self.fill_mode_by(field, &keys, &mut cols.gender, summary)?;
                }
                CustomerField::AnnualIncome => {
                    let keys = text_keys(&cols.gender);
                    self.fill_mean_by(field, &keys, &mut cols.annual_income, summary)?;
                }
                CustomerField::Age => {
                    let keys = numeric_keys(&cols.annual_income);
                    self.fill_mean_by(field, &keys, &mut cols.age, summary)?;
                }
                CustomerField::PurchaseFrequency => {
                    let keys: Vec<Option<NumericKey>> = numeric_keys(&cols.purchase_history);
                    self.fill_mode_by(field, &keys, &mut cols.purchase_frequency, summary)?;
                }
                CustomerField::PurchaseHistory => {
                    let keys = text_keys(&cols.purchase_frequency);
                    self.fill_mean_by(field, &keys, &mut cols.purchase_history, summary)?;
                }
                CustomerField::Latitude => {
                    let keys = text_keys(&cols.gender);
                    self.fill_mean_by(field, &keys, &mut cols.latitude, summary)?;
                }
                CustomerField::Longitude => {
                    let keys = text_keys(&cols.gender);
                    self.fill_mean_by(field, &keys, &mut cols.longitude, summary)?;
                }
            }
        }
        Ok(())
    }

    /// Group mean by `keys`, then global mean, then placeholder.
    fn fill_mean_by<K: Ord + Copy>(
        &self,
        field: CustomerField,
        keys: &[Option<K>],
        values: &mut [Option<f64>],
        summary: &mut ImputationSummary,
    ) -> Result<()> {
        if values.iter().all(Option::is_some) {
            return Ok(());
        }

        let global = mean_of(known_numbers(values));
        let groups = group_means(keys, values);
        let from_group = fill_from_groups(keys, values, &groups);
        self.record(summary, field, FillSource::Group, from_group);

        if let Some(global) = global {
            let from_global = fill_constant(values, &global);
            self.record(summary, field, FillSource::Global, from_global);
        }

        let placeholder = self.config.numeric_placeholder;
        self.fill_placeholder(field, values, &placeholder, summary)
    }

    /// Group mode by `keys`, then global mode.
    fn fill_mode_by<K: Ord + Copy>(
        &self,
        field: CustomerField,
        keys: &[Option<K>],
        values: &mut [Option<String>],
        summary: &mut ImputationSummary,
    ) -> Result<()> {
        if values.iter().all(Option::is_some) {
            return Ok(());
        }

        let groups = group_modes(keys, values);
        let from_group = fill_from_groups(keys, values, &groups);
        self.record(summary, field, FillSource::Group, from_group);

        self.fill_mode_global(field, values, summary)
    }

    /// Global mode, then placeholder.
    fn fill_mode_global(
        &self,
        field: CustomerField,
        values: &mut [Option<String>],
        summary: &mut ImputationSummary,
    ) -> Result<()> {
        if values.iter().all(Option::is_some) {
            return Ok(());
        }

        if let Some(global) = mode_of(known_labels(values)) {
            let from_global = fill_constant(values, &global);
            self.record(summary, field, FillSource::Global, from_global);
        }

        let placeholder = self.config.categorical_placeholder.clone();
        self.fill_placeholder(field, values, &placeholder, summary)
    }

    /// Last resort for fields with no known value at all.
    fn fill_placeholder<V: Clone + std::fmt::Debug>(
        &self,
        field: CustomerField,
        values: &mut [Option<V>],
        placeholder: &V,
        summary: &mut ImputationSummary,
    ) -> Result<()> {
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            return Ok(());
        }

        let column = field.column_name(&self.config.columns);
        match self.config.empty_column_policy {
            EmptyColumnPolicy::Error => Err(InsightsError::NoValidValues(column.to_string())),
            EmptyColumnPolicy::Placeholder => {
                warn!(
                    "Column '{}' has no known values, filling {} rows with {:?}",
                    column, missing, placeholder
                );
                summary.add_warning(format!(
                    "'{}' had no known values; filled {} rows with placeholder {:?}",
                    column, missing, placeholder
                ));
                let filled = fill_constant(values, placeholder);
                self.record(summary, field, FillSource::Placeholder, filled);
                Ok(())
            }
        }
    }

    fn record(
        &self,
        summary: &mut ImputationSummary,
        field: CustomerField,
        source: FillSource,
        count: usize,
    ) {
        if count == 0 {
            return;
        }
        debug!(
            "Filled {} '{}' values from {:?}",
            count,
            field.column_name(&self.config.columns),
            source
        );
        if let Some(entry) = summary.field_mut(field) {
            entry.record(source, count);
        }
    }
}
