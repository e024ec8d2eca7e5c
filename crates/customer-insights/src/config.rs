//! Configuration types for imputation and analysis.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic setup. Column names, pass limits and
//! placeholder values are all explicit here rather than embedded in the
//! imputer.

use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Names of the columns the imputer reads and writes.
///
/// Names are matched exactly (case- and accent-sensitive). The defaults
/// follow the reference customer dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub name: String,
    pub gender: String,
    pub annual_income: String,
    pub age: String,
    pub purchase_frequency: String,
    pub purchase_history: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            name: "Nombre".to_string(),
            gender: "Género".to_string(),
            annual_income: "Ingreso_Anual_USD".to_string(),
            age: "Edad".to_string(),
            purchase_frequency: "Frecuencia_Compra".to_string(),
            purchase_history: "Historial_Compras".to_string(),
            latitude: "Latitud".to_string(),
            longitude: "Longitud".to_string(),
        }
    }
}

impl ColumnMapping {
    /// All mapped column names, in imputation order.
    pub fn all(&self) -> [&str; 8] {
        [
            &self.name,
            &self.gender,
            &self.annual_income,
            &self.age,
            &self.purchase_frequency,
            &self.purchase_history,
            &self.latitude,
            &self.longitude,
        ]
    }
}

/// What to do when a field has no known value anywhere in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EmptyColumnPolicy {
    /// Fill with the configured placeholder and record a warning
    #[default]
    Placeholder,
    /// Fail with `NoValidValues`
    Error,
}

/// Configuration for the grouped imputation cascade.
///
/// Use [`ImputerConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use customer_insights::config::{ImputerConfig, EmptyColumnPolicy};
///
/// let config = ImputerConfig::builder()
///     .max_passes(3)
///     .empty_column_policy(EmptyColumnPolicy::Error)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputerConfig {
    /// Column names for the imputed fields.
    pub columns: ColumnMapping,

    /// Upper bound on cascade passes. The cascade stops early once no
    /// value is missing.
    /// Default: 2
    pub max_passes: usize,

    /// Behaviour for fields with no known value at all.
    /// Default: Placeholder
    pub empty_column_policy: EmptyColumnPolicy,

    /// Fill value for entirely-missing categorical fields.
    /// Default: "Unknown"
    pub categorical_placeholder: String,

    /// Fill value for entirely-missing numeric fields.
    /// Default: 0.0
    pub numeric_placeholder: f64,
}

impl Default for ImputerConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            max_passes: 2,
            empty_column_policy: EmptyColumnPolicy::default(),
            categorical_placeholder: "Unknown".to_string(),
            numeric_placeholder: 0.0,
        }
    }
}

impl ImputerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ImputerConfigBuilder {
        ImputerConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ImputerConfig = serde_json::from_str(&content)?;
        config.validate().map_err(InsightsError::from)?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.max_passes == 0 {
            return Err(ConfigValidationError::InvalidMaxPasses(self.max_passes));
        }

        let names = self.columns.all();
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName);
            }
            if names[..i].contains(name) {
                return Err(ConfigValidationError::DuplicateColumn(name.to_string()));
            }
        }

        if !self.numeric_placeholder.is_finite() {
            return Err(ConfigValidationError::NonFinitePlaceholder(
                self.numeric_placeholder,
            ));
        }

        if self.categorical_placeholder.trim().is_empty() {
            return Err(ConfigValidationError::EmptyPlaceholder);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid max passes: {0} (must be at least 1)")]
    InvalidMaxPasses(usize),

    #[error("Column names must not be empty")]
    EmptyColumnName,

    #[error("Column '{0}' is mapped to more than one field")]
    DuplicateColumn(String),

    #[error("Numeric placeholder must be finite, got {0}")]
    NonFinitePlaceholder(f64),

    #[error("Categorical placeholder must not be empty")]
    EmptyPlaceholder,

    #[error("Invalid top N: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Invalid heatmap grid size: {0} (must be at least 1)")]
    InvalidGridSize(usize),
}

/// Builder for [`ImputerConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ImputerConfigBuilder {
    columns: Option<ColumnMapping>,
    max_passes: Option<usize>,
    empty_column_policy: Option<EmptyColumnPolicy>,
    categorical_placeholder: Option<String>,
    numeric_placeholder: Option<f64>,
}

impl ImputerConfigBuilder {
    /// Set the column names for the imputed fields.
    pub fn columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Set the maximum number of cascade passes.
    pub fn max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// Set the behaviour for entirely-missing fields.
    pub fn empty_column_policy(mut self, policy: EmptyColumnPolicy) -> Self {
        self.empty_column_policy = Some(policy);
        self
    }

    /// Set the categorical placeholder value.
    pub fn categorical_placeholder(mut self, value: impl Into<String>) -> Self {
        self.categorical_placeholder = Some(value.into());
        self
    }

    /// Set the numeric placeholder value.
    pub fn numeric_placeholder(mut self, value: f64) -> Self {
        self.numeric_placeholder = Some(value);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ImputerConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<ImputerConfig, ConfigValidationError> {
        let config = ImputerConfig {
            columns: self.columns.unwrap_or_default(),
            max_passes: self.max_passes.unwrap_or(2),
            empty_column_policy: self.empty_column_policy.unwrap_or_default(),
            categorical_placeholder: self
                .categorical_placeholder
                .unwrap_or_else(|| "Unknown".to_string()),
            numeric_placeholder: self.numeric_placeholder.unwrap_or(0.0),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Parameters for the descriptive analyses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of highest-income customers in the distance matrix.
    /// Default: 10
    pub top_n: usize,

    /// Number of bins per axis in the income heatmap.
    /// Default: 50
    pub heatmap_grid_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            heatmap_grid_size: 50,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_n));
        }
        if self.heatmap_grid_size == 0 {
            return Err(ConfigValidationError::InvalidGridSize(
                self.heatmap_grid_size,
            ));
        }
        Ok(())
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    top_n: Option<usize>,
    heatmap_grid_size: Option<usize>,
}

impl AnalysisConfigBuilder {
    /// Set the number of customers in the distance matrix.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set the number of heatmap bins per axis.
    pub fn heatmap_grid_size(mut self, size: usize) -> Self {
        self.heatmap_grid_size = Some(size);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> std::result::Result<AnalysisConfig, ConfigValidationError> {
        let config = AnalysisConfig {
            top_n: self.top_n.unwrap_or(10),
            heatmap_grid_size: self.heatmap_grid_size.unwrap_or(50),
        };
        config.validate()?;
        Ok(config)
    }
}
