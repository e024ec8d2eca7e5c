//! Age vs income correlation.

use crate::types::CustomerColumns;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pearson correlation of age and annual income, overall and per segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Over every row with both values known.
    pub global: Option<f64>,
    /// Keyed by gender.
    pub by_gender: BTreeMap<String, Option<f64>>,
    /// Keyed by purchase frequency.
    pub by_frequency: BTreeMap<String, Option<f64>>,
}

/// Fewest complete pairs a correlation is computed from.
pub const MIN_PAIRS: usize = 3;

/// Pearson correlation coefficient over paired observations.
///
/// Pairs with a missing side are skipped. Returns `None` with fewer than
/// [`MIN_PAIRS`] complete pairs or when either side has zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let (x, y): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    if x.len() < MIN_PAIRS || is_constant(&x) || is_constant(&y) {
        return None;
    }

    anofox_statistics::correlation::pearson(&x, &y, Some(0.95))
        .ok()
        .map(|result| result.estimate)
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(-1.0, 1.0))
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Correlation per distinct key. Rows without a key are ignored.
fn pearson_by(
    keys: &[Option<String>],
    xs: &[Option<f64>],
    ys: &[Option<f64>],
) -> BTreeMap<String, Option<f64>> {
    let mut groups: BTreeMap<&str, (Vec<Option<f64>>, Vec<Option<f64>>)> = BTreeMap::new();
    for ((key, x), y) in keys.iter().zip(xs).zip(ys) {
        if let Some(key) = key {
            let entry = groups.entry(key.as_str()).or_default();
            entry.0.push(*x);
            entry.1.push(*y);
        }
    }

    groups
        .into_iter()
        .map(|(key, (gx, gy))| (key.to_string(), pearson(&gx, &gy)))
        .collect()
}

/// Age vs annual income correlation, globally and per gender and frequency.
pub fn age_income_correlation(cols: &CustomerColumns) -> CorrelationReport {
    CorrelationReport {
        global: pearson(&cols.age, &cols.annual_income),
        by_gender: pearson_by(&cols.gender, &cols.age, &cols.annual_income),
        by_frequency: pearson_by(&cols.purchase_frequency, &cols.age, &cols.annual_income),
    }
}
