//! Customer counts by gender and purchase frequency.

use crate::types::{CustomerColumns, CustomerField};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Categorical column a view can be segmented by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentColumn {
    Gender,
    Frequency,
}

impl SegmentColumn {
    pub fn field(&self) -> CustomerField {
        match self {
            Self::Gender => CustomerField::Gender,
            Self::Frequency => CustomerField::PurchaseFrequency,
        }
    }

    /// The column's values, one per row.
    pub fn values<'a>(&self, cols: &'a CustomerColumns) -> &'a [Option<String>] {
        match self {
            Self::Gender => &cols.gender,
            Self::Frequency => &cols.purchase_frequency,
        }
    }
}

impl fmt::Display for SegmentColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field().display_name())
    }
}

/// Distinct known values of a segment column, sorted.
pub fn segment_values(cols: &CustomerColumns, column: SegmentColumn) -> Vec<String> {
    column
        .values(cols)
        .iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of customers sharing a purchase frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyCluster {
    pub frequency: String,
    pub customers: usize,
}

/// Customer count per purchase frequency, largest cluster first.
///
/// Clusters of equal size are ordered by frequency value.
pub fn frequency_clusters(cols: &CustomerColumns) -> Vec<FrequencyCluster> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for freq in cols.purchase_frequency.iter().flatten() {
        *counts.entry(freq.as_str()).or_insert(0) += 1;
    }

    let mut clusters: Vec<FrequencyCluster> = counts
        .into_iter()
        .map(|(frequency, customers)| FrequencyCluster {
            frequency: frequency.to_string(),
            customers,
        })
        .collect();
    // Stable sort keeps the BTreeMap's value order among equal counts
    clusters.sort_by(|a, b| b.customers.cmp(&a.customers));
    clusters
}

/// Gender x purchase frequency contingency table.
///
/// `counts[i][j]` is the number of customers with gender `genders[i]` and
/// frequency `frequencies[j]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderFrequencyTable {
    pub genders: Vec<String>,
    pub frequencies: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl GenderFrequencyTable {
    /// Count for one combination; zero for unknown labels.
    pub fn count(&self, gender: &str, frequency: &str) -> usize {
        let row = self.genders.iter().position(|g| g == gender);
        let col = self.frequencies.iter().position(|f| f == frequency);
        match (row, col) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    /// Total customers in a gender row.
    pub fn row_total(&self, gender: &str) -> usize {
        self.genders
            .iter()
            .position(|g| g == gender)
            .map(|r| self.counts[r].iter().sum())
            .unwrap_or(0)
    }
}

/// Cross-tabulate gender against purchase frequency.
///
/// Rows missing either value are not counted.
pub fn gender_frequency_table(cols: &CustomerColumns) -> GenderFrequencyTable {
    let pairs: Vec<(&str, &str)> = cols
        .gender
        .iter()
        .zip(&cols.purchase_frequency)
        .filter_map(|(g, f)| Some((g.as_deref()?, f.as_deref()?)))
        .collect();

    let genders: Vec<String> = pairs
        .iter()
        .map(|(g, _)| *g)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let frequencies: Vec<String> = pairs
        .iter()
        .map(|(_, f)| *f)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut counts = vec![vec![0; frequencies.len()]; genders.len()];
    for (g, f) in pairs {
        let (Some(r), Some(c)) = (
            genders.iter().position(|x| x == g),
            frequencies.iter().position(|x| x == f),
        ) else {
            continue;
        };
        counts[r][c] += 1;
    }

    GenderFrequencyTable {
        genders,
        frequencies,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CustomerRecord;
    use pretty_assertions::assert_eq;

    fn customer(gender: Option<&str>, freq: Option<&str>) -> CustomerRecord {
        CustomerRecord {
            gender: gender.map(str::to_string),
            purchase_frequency: freq.map(str::to_string),
            ..CustomerRecord::default()
        }
    }

    fn sample() -> CustomerColumns {
        CustomerColumns::from_records(&[
            customer(Some("M"), Some("Baja")),
            customer(Some("F"), Some("Alta")),
            customer(Some("F"), Some("Media")),
            customer(Some("M"), Some("Alta")),
            customer(Some("F"), Some("Alta")),
            customer(None, Some("Media")),
        ])
    }

    #[test]
    fn test_segment_values_sorted_and_distinct() {
        let cols = sample();
        assert_eq!(segment_values(&cols, SegmentColumn::Gender), vec!["F", "M"]);
        assert_eq!(
            segment_values(&cols, SegmentColumn::Frequency),
            vec!["Alta", "Baja", "Media"]
        );
    }

    #[test]
    fn test_frequency_clusters_order() {
        let clusters = frequency_clusters(&sample());
        let summary: Vec<(&str, usize)> = clusters
            .iter()
            .map(|c| (c.frequency.as_str(), c.customers))
            .collect();
        assert_eq!(summary, vec![("Alta", 3), ("Media", 2), ("Baja", 1)]);
    }

    #[test]
    fn test_frequency_clusters_tie_ordered_by_value() {
        let cols = CustomerColumns::from_records(&[
            customer(None, Some("Media")),
            customer(None, Some("Baja")),
        ]);
        let names: Vec<String> = frequency_clusters(&cols)
            .into_iter()
            .map(|c| c.frequency)
            .collect();
        assert_eq!(names, vec!["Baja", "Media"]);
    }

    #[test]
    fn test_gender_frequency_table() {
        let table = gender_frequency_table(&sample());
        assert_eq!(table.genders, vec!["F", "M"]);
        assert_eq!(table.frequencies, vec!["Alta", "Baja", "Media"]);
        assert_eq!(table.counts, vec![vec![2, 0, 1], vec![1, 1, 0]]);
        assert_eq!(table.count("M", "Media"), 0);
        assert_eq!(table.count("X", "Alta"), 0);
        assert_eq!(table.row_total("F"), 3);
    }

    #[test]
    fn test_segment_column_display() {
        assert_eq!(SegmentColumn::Frequency.to_string(), "Purchase frequency");
    }
}
