//! Descriptive analyses over a cleaned customer dataset.
//!
//! All views read the typed [`CustomerColumns`] and return serializable
//! results so they can be printed as tables or emitted as JSON.

mod correlation;
mod geo;
mod segments;

pub use correlation::{CorrelationReport, age_income_correlation, pearson};
pub use geo::{
    BuyerDistances, CustomerLocation, GridBounds, HeatmapCell, IncomeHeatmap, LocationFilter,
    buyer_distances, customer_locations, income_heatmap,
};
pub use segments::{
    FrequencyCluster, GenderFrequencyTable, SegmentColumn, frequency_clusters,
    gender_frequency_table, segment_values,
};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::types::CustomerColumns;
use tracing::debug;

/// Runs the analyses with a shared configuration.
///
/// # Example
///
/// ```rust,ignore
/// use customer_insights::{AnalysisConfig, CustomerAnalyzer};
///
/// let cols = result.columns(&config.columns)?;
/// let analyzer = CustomerAnalyzer::new(&cols, AnalysisConfig::default())?;
/// println!("{:?}", analyzer.correlation().global);
/// ```
pub struct CustomerAnalyzer<'a> {
    cols: &'a CustomerColumns,
    config: AnalysisConfig,
}

impl<'a> CustomerAnalyzer<'a> {
    pub fn new(cols: &'a CustomerColumns, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        debug!("Analysing {} customers", cols.len());
        Ok(Self { cols, config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn correlation(&self) -> CorrelationReport {
        age_income_correlation(self.cols)
    }

    pub fn locations(&self, filter: Option<&LocationFilter>) -> Vec<CustomerLocation> {
        customer_locations(self.cols, filter)
    }

    pub fn segment_values(&self, column: SegmentColumn) -> Vec<String> {
        segment_values(self.cols, column)
    }

    pub fn frequency_clusters(&self) -> Vec<FrequencyCluster> {
        frequency_clusters(self.cols)
    }

    pub fn gender_frequency(&self) -> GenderFrequencyTable {
        gender_frequency_table(self.cols)
    }

    pub fn income_heatmap(&self) -> IncomeHeatmap {
        income_heatmap(self.cols, self.config.heatmap_grid_size)
    }

    pub fn buyer_distances(&self) -> BuyerDistances {
        buyer_distances(self.cols, self.config.top_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CustomerRecord;

    #[test]
    fn test_analyzer_rejects_invalid_config() {
        let cols = CustomerColumns::default();
        let config = AnalysisConfig {
            top_n: 0,
            ..AnalysisConfig::default()
        };
        assert!(CustomerAnalyzer::new(&cols, config).is_err());
    }

    #[test]
    fn test_analyzer_uses_configured_top_n() {
        let records: Vec<CustomerRecord> = (0..5)
            .map(|i| CustomerRecord {
                annual_income: Some(1000.0 * i as f64),
                latitude: Some(i as f64),
                longitude: Some(0.0),
                ..CustomerRecord::default()
            })
            .collect();
        let cols = CustomerColumns::from_records(&records);
        let config = AnalysisConfig::builder().top_n(2).build().unwrap();

        let analyzer = CustomerAnalyzer::new(&cols, config).unwrap();
        assert_eq!(analyzer.buyer_distances().rows, vec![4, 3]);
    }
}
