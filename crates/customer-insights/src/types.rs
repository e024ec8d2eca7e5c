use crate::config::ColumnMapping;
use crate::error::{InsightsError, Result, ResultExt};
use crate::utils::{count_missing, numeric_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// Customer Fields and Records
// ============================================================================

/// The nullable fields of a customer record, in imputation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerField {
    Name,
    Gender,
    AnnualIncome,
    Age,
    PurchaseFrequency,
    PurchaseHistory,
    Latitude,
    Longitude,
}

impl CustomerField {
    /// All fields in the order the cascade processes them.
    pub const ALL: [CustomerField; 8] = [
        CustomerField::Name,
        CustomerField::Gender,
        CustomerField::AnnualIncome,
        CustomerField::Age,
        CustomerField::PurchaseFrequency,
        CustomerField::PurchaseHistory,
        CustomerField::Latitude,
        CustomerField::Longitude,
    ];

    /// Column name of this field under the given mapping.
    pub fn column_name<'a>(&self, columns: &'a ColumnMapping) -> &'a str {
        match self {
            Self::Name => &columns.name,
            Self::Gender => &columns.gender,
            Self::AnnualIncome => &columns.annual_income,
            Self::Age => &columns.age,
            Self::PurchaseFrequency => &columns.purchase_frequency,
            Self::PurchaseHistory => &columns.purchase_history,
            Self::Latitude => &columns.latitude,
            Self::Longitude => &columns.longitude,
        }
    }

    /// Returns a human-readable name for the field.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Gender => "Gender",
            Self::AnnualIncome => "Annual income",
            Self::Age => "Age",
            Self::PurchaseFrequency => "Purchase frequency",
            Self::PurchaseHistory => "Purchase history",
            Self::Latitude => "Latitude",
            Self::Longitude => "Longitude",
        }
    }
}

/// One customer row. Any field may be absent before imputation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub annual_income: Option<f64>,
    pub age: Option<f64>,
    pub purchase_frequency: Option<String>,
    pub purchase_history: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Column-oriented view of the imputed fields of a dataset.
///
/// All vectors have the same length, one entry per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerColumns {
    pub name: Vec<Option<String>>,
    pub gender: Vec<Option<String>>,
    pub annual_income: Vec<Option<f64>>,
    pub age: Vec<Option<f64>>,
    pub purchase_frequency: Vec<Option<String>>,
    pub purchase_history: Vec<Option<f64>>,
    pub latitude: Vec<Option<f64>>,
    pub longitude: Vec<Option<f64>>,
}

impl CustomerColumns {
    /// Extract the mapped columns from a DataFrame.
    ///
    /// # Errors
    ///
    /// Returns [`InsightsError::ColumnNotFound`] for the first mapped column
    /// absent from the frame, and [`InsightsError::TypeConversionFailed`]
    /// when a numeric field cannot be read as numbers.
    pub fn from_frame(df: &DataFrame, columns: &ColumnMapping) -> Result<Self> {
        Self::validate_schema(df, columns)?;

        let text = |field: CustomerField| -> Result<Vec<Option<String>>> {
            let name = field.column_name(columns);
            let series = df.column(name)?.as_materialized_series();
            string_values(series).context(format!("Reading column '{}'", name))
        };
        let numeric = |field: CustomerField| -> Result<Vec<Option<f64>>> {
            let name = field.column_name(columns);
            let series = df.column(name)?.as_materialized_series();
            numeric_values(series)
        };

        Ok(Self {
            name: text(CustomerField::Name)?,
            gender: text(CustomerField::Gender)?,
            annual_income: numeric(CustomerField::AnnualIncome)?,
            age: numeric(CustomerField::Age)?,
            purchase_frequency: text(CustomerField::PurchaseFrequency)?,
            purchase_history: numeric(CustomerField::PurchaseHistory)?,
            latitude: numeric(CustomerField::Latitude)?,
            longitude: numeric(CustomerField::Longitude)?,
        })
    }

    /// Check that every mapped column exists in the frame.
    pub fn validate_schema(df: &DataFrame, columns: &ColumnMapping) -> Result<()> {
        for name in columns.all() {
            if df.column(name).is_err() {
                return Err(InsightsError::ColumnNotFound(name.to_string()));
            }
        }
        Ok(())
    }

    /// Build the column view from row records.
    pub fn from_records(records: &[CustomerRecord]) -> Self {
        let mut cols = Self::default();
        for r in records {
            cols.name.push(r.name.clone());
            cols.gender.push(r.gender.clone());
            cols.annual_income.push(r.annual_income);
            cols.age.push(r.age);
            cols.purchase_frequency.push(r.purchase_frequency.clone());
            cols.purchase_history.push(r.purchase_history);
            cols.latitude.push(r.latitude);
            cols.longitude.push(r.longitude);
        }
        cols
    }

    /// Row view of the columns.
    pub fn records(&self) -> Vec<CustomerRecord> {
        (0..self.len())
            .map(|i| CustomerRecord {
                name: self.name[i].clone(),
                gender: self.gender[i].clone(),
                annual_income: self.annual_income[i],
                age: self.age[i],
                purchase_frequency: self.purchase_frequency[i].clone(),
                purchase_history: self.purchase_history[i],
                latitude: self.latitude[i],
                longitude: self.longitude[i],
            })
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.name.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Missing entries in one field.
    pub fn missing_in(&self, field: CustomerField) -> usize {
        match field {
            CustomerField::Name => count_missing(&self.name),
            CustomerField::Gender => count_missing(&self.gender),
            CustomerField::AnnualIncome => count_missing(&self.annual_income),
            CustomerField::Age => count_missing(&self.age),
            CustomerField::PurchaseFrequency => count_missing(&self.purchase_frequency),
            CustomerField::PurchaseHistory => count_missing(&self.purchase_history),
            CustomerField::Latitude => count_missing(&self.latitude),
            CustomerField::Longitude => count_missing(&self.longitude),
        }
    }

    /// Missing entries across all fields.
    pub fn missing_count(&self) -> usize {
        CustomerField::ALL.iter().map(|f| self.missing_in(*f)).sum()
    }

    /// Write the columns back into `df`, replacing the mapped columns.
    ///
    /// Categorical fields are written as String, numeric fields as Float64.
    /// Other columns are left untouched.
    pub fn write_into(&self, df: &mut DataFrame, columns: &ColumnMapping) -> Result<()> {
        for field in CustomerField::ALL {
            let name = field.column_name(columns);
            let series = self.series_for(field, name);
            df.replace(name, series)
                .context(format!("Writing column '{}'", name))?;
        }
        Ok(())
    }

    /// Build a DataFrame holding only the mapped columns.
    pub fn to_frame(&self, columns: &ColumnMapping) -> Result<DataFrame> {
        let cols: Vec<Column> = CustomerField::ALL
            .iter()
            .map(|field| self.series_for(*field, field.column_name(columns)).into())
            .collect();
        Ok(DataFrame::new(cols)?)
    }

    fn series_for(&self, field: CustomerField, name: &str) -> Series {
        match field {
            CustomerField::Name => Series::new(name.into(), &self.name),
            CustomerField::Gender => Series::new(name.into(), &self.gender),
            CustomerField::AnnualIncome => Series::new(name.into(), &self.annual_income),
            CustomerField::Age => Series::new(name.into(), &self.age),
            CustomerField::PurchaseFrequency => {
                Series::new(name.into(), &self.purchase_frequency)
            }
            CustomerField::PurchaseHistory => Series::new(name.into(), &self.purchase_history),
            CustomerField::Latitude => Series::new(name.into(), &self.latitude),
            CustomerField::Longitude => Series::new(name.into(), &self.longitude),
        }
    }
}

// ============================================================================
// Imputation Summary Types
// ============================================================================

/// Where an imputed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillSource {
    /// Aggregate over rows sharing the grouping key
    Group,
    /// Aggregate over the whole column
    Global,
    /// Configured constant for an entirely-missing field
    Placeholder,
}

/// Per-field account of what the cascade filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field: CustomerField,
    pub column: String,
    /// Missing values before imputation.
    pub missing_before: usize,
    /// Values filled from the grouped aggregate.
    pub filled_from_group: usize,
    /// Values filled from the global statistic.
    pub filled_from_global: usize,
    /// Values filled with the placeholder.
    pub filled_from_placeholder: usize,
}

impl FieldSummary {
    pub fn new(field: CustomerField, column: impl Into<String>, missing_before: usize) -> Self {
        Self {
            field,
            column: column.into(),
            missing_before,
            filled_from_group: 0,
            filled_from_global: 0,
            filled_from_placeholder: 0,
        }
    }

    /// Record `count` values filled from `source`.
    pub fn record(&mut self, source: FillSource, count: usize) {
        match source {
            FillSource::Group => self.filled_from_group += count,
            FillSource::Global => self.filled_from_global += count,
            FillSource::Placeholder => self.filled_from_placeholder += count,
        }
    }

    /// Total values filled in this field.
    pub fn total_filled(&self) -> usize {
        self.filled_from_group + self.filled_from_global + self.filled_from_placeholder
    }
}

/// Human-readable summary of what the imputer did.
///
/// # Example
///
/// ```rust,ignore
/// let summary = result.summary;
/// println!("Filled {} cells in {} passes", summary.cells_filled(), summary.passes);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    /// Number of rows processed.
    pub rows: usize,
    /// Number of cascade passes run.
    pub passes: usize,
    /// Missing cells across the imputed fields before imputation.
    pub missing_before: usize,
    /// Missing cells across the imputed fields after imputation.
    pub missing_after: usize,
    /// Share of known cells before imputation (0.0 - 1.0).
    pub completeness_before: f32,
    /// Share of known cells after imputation (0.0 - 1.0).
    pub completeness_after: f32,
    /// Per-field fill counts, in imputation order.
    pub fields: Vec<FieldSummary>,
    /// Warnings and notes generated during imputation.
    pub warnings: Vec<String>,
}

impl Default for ImputationSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl ImputationSummary {
    pub fn new() -> Self {
        Self {
            duration_ms: 0,
            rows: 0,
            passes: 0,
            missing_before: 0,
            missing_after: 0,
            completeness_before: 1.0,
            completeness_after: 1.0,
            fields: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Summary entry for a field, if recorded.
    pub fn field(&self, field: CustomerField) -> Option<&FieldSummary> {
        self.fields.iter().find(|f| f.field == field)
    }

    /// Mutable summary entry for a field, if recorded.
    pub fn field_mut(&mut self, field: CustomerField) -> Option<&mut FieldSummary> {
        self.fields.iter_mut().find(|f| f.field == field)
    }

    /// Total cells filled across all fields.
    pub fn cells_filled(&self) -> usize {
        self.fields.iter().map(FieldSummary::total_filled).sum()
    }

    /// Share of known cells for `rows` rows with `missing` gaps over all fields.
    pub fn completeness(rows: usize, missing: usize) -> f32 {
        let total = rows * CustomerField::ALL.len();
        if total == 0 {
            1.0
        } else {
            1.0 - (missing as f32 / total as f32)
        }
    }
}

// ============================================================================
// Pipeline Result
// ============================================================================

/// Result returned by [`crate::Pipeline::process`].
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The imputed dataset. Unmapped columns are carried through unchanged.
    pub data: DataFrame,
    /// What the imputer did.
    pub summary: ImputationSummary,
}

impl PipelineResult {
    /// Typed view over the imputed customer fields.
    pub fn columns(&self, mapping: &ColumnMapping) -> Result<CustomerColumns> {
        CustomerColumns::from_frame(&self.data, mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df![
            "Nombre" => [Some("Ana"), None],
            "Género" => [Some("F"), None],
            "Ingreso_Anual_USD" => [Some(50000_i64), None],
            "Edad" => [Some(30_i64), Some(41)],
            "Frecuencia_Compra" => [Some("Alta"), None],
            "Historial_Compras" => [Some(12.0), None],
            "Latitud" => [Some(4.6), None],
            "Longitud" => [Some(-74.1), None],
            "Correo" => ["ana@example.com", "x@example.com"],
        ]
        .unwrap()
    }

    #[test]
    fn test_from_frame_reads_all_fields() {
        let cols = CustomerColumns::from_frame(&sample_frame(), &ColumnMapping::default()).unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols.name[0].as_deref(), Some("Ana"));
        assert_eq!(cols.annual_income[0], Some(50000.0));
        assert_eq!(cols.age[1], Some(41.0));
        assert_eq!(cols.missing_in(CustomerField::Age), 0);
        assert_eq!(cols.missing_count(), 7);
    }

    #[test]
    fn test_from_frame_missing_column() {
        let df = sample_frame().drop("Latitud").unwrap();
        let err = CustomerColumns::from_frame(&df, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, InsightsError::ColumnNotFound(ref c) if c == "Latitud"));
    }

    #[test]
    fn test_column_names_are_accent_sensitive() {
        let mut df = sample_frame();
        df.rename("Género", "Genero".into()).unwrap();
        let err = CustomerColumns::from_frame(&df, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, InsightsError::ColumnNotFound(ref c) if c == "Género"));
    }

    #[test]
    fn test_write_into_keeps_display_columns() {
        let mut df = sample_frame();
        let mut cols = CustomerColumns::from_frame(&df, &ColumnMapping::default()).unwrap();
        cols.gender[1] = Some("M".to_string());
        cols.write_into(&mut df, &ColumnMapping::default()).unwrap();

        assert_eq!(df.width(), 9);
        assert!(df.column("Correo").is_ok());
        let reread = CustomerColumns::from_frame(&df, &ColumnMapping::default()).unwrap();
        assert_eq!(reread.gender[1].as_deref(), Some("M"));
        assert_eq!(df.column("Edad").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_records_round_trip_through_columns() {
        let records = vec![
            CustomerRecord {
                name: Some("Luis".to_string()),
                age: Some(28.0),
                ..CustomerRecord::default()
            },
            CustomerRecord::default(),
        ];
        let cols = CustomerColumns::from_records(&records);
        assert_eq!(cols.len(), 2);
        assert_eq!(cols.records(), records);
    }

    #[test]
    fn test_to_frame_uses_mapping() {
        let cols = CustomerColumns::from_frame(&sample_frame(), &ColumnMapping::default()).unwrap();
        let df = cols.to_frame(&ColumnMapping::default()).unwrap();
        assert_eq!(df.shape(), (2, 8));
        assert!(df.column("Correo").is_err());
    }

    #[test]
    fn test_field_summary_record() {
        let mut summary = FieldSummary::new(CustomerField::Age, "Edad", 3);
        summary.record(FillSource::Group, 2);
        summary.record(FillSource::Global, 1);
        assert_eq!(summary.total_filled(), 3);
        assert_eq!(summary.filled_from_placeholder, 0);
    }

    #[test]
    fn test_completeness() {
        assert_eq!(ImputationSummary::completeness(0, 0), 1.0);
        assert_eq!(ImputationSummary::completeness(1, 4), 0.5);
    }

    #[test]
    fn test_field_serialization() {
        let json = serde_json::to_string(&CustomerField::PurchaseFrequency).unwrap();
        assert_eq!(json, "\"purchase_frequency\"");
    }
}
