//! Location-based views: customer points, income heatmap and distances
//! between the highest-income buyers.

use super::segments::SegmentColumn;
use crate::types::CustomerColumns;
use crate::utils::mean_of;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A customer's position, labelled by its row in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomerLocation {
    pub row: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// Keep only customers whose segment column equals `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFilter {
    pub column: SegmentColumn,
    pub value: String,
}

impl LocationFilter {
    pub fn new(column: SegmentColumn, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// Positions of customers with known coordinates, optionally filtered.
pub fn customer_locations(
    cols: &CustomerColumns,
    filter: Option<&LocationFilter>,
) -> Vec<CustomerLocation> {
    (0..cols.len())
        .filter(|&row| match filter {
            Some(f) => f.column.values(cols)[row].as_deref() == Some(f.value.as_str()),
            None => true,
        })
        .filter_map(|row| {
            Some(CustomerLocation {
                row,
                latitude: cols.latitude[row]?,
                longitude: cols.longitude[row]?,
            })
        })
        .collect()
}

// =============================================================================
// Income heatmap
// =============================================================================

/// Extent of the heatmap grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

/// One non-empty heatmap cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    /// Latitude bin, 0 at the southern edge.
    pub row: usize,
    /// Longitude bin, 0 at the western edge.
    pub column: usize,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub customers: usize,
    pub mean_income: f64,
}

/// Mean annual income binned over a `grid_size x grid_size` lat/lon grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeHeatmap {
    pub grid_size: usize,
    /// `None` when no customer has coordinates and income.
    pub bounds: Option<GridBounds>,
    /// Non-empty cells ordered by row, then column.
    pub cells: Vec<HeatmapCell>,
}

fn bin_index(value: f64, min: f64, max: f64, bins: usize) -> usize {
    let span = max - min;
    if span <= 0.0 {
        return 0;
    }
    let idx = ((value - min) / span * bins as f64).floor() as usize;
    // The maximum lands on the upper edge; keep it in the last bin
    idx.min(bins - 1)
}

fn bin_center(idx: usize, min: f64, max: f64, bins: usize) -> f64 {
    let width = (max - min) / bins as f64;
    min + width * (idx as f64 + 0.5)
}

/// Bin customers by position and average their income per cell.
///
/// Rows missing latitude, longitude or income are skipped. A `grid_size` of
/// zero is treated as one.
pub fn income_heatmap(cols: &CustomerColumns, grid_size: usize) -> IncomeHeatmap {
    let bins = grid_size.max(1);
    let points: Vec<(f64, f64, f64)> = (0..cols.len())
        .filter_map(|i| Some((cols.longitude[i]?, cols.latitude[i]?, cols.annual_income[i]?)))
        .collect();

    let Some(&(first_lon, first_lat, _)) = points.first() else {
        return IncomeHeatmap {
            grid_size: bins,
            bounds: None,
            cells: Vec::new(),
        };
    };

    let bounds = points.iter().fold(
        GridBounds {
            min_longitude: first_lon,
            max_longitude: first_lon,
            min_latitude: first_lat,
            max_latitude: first_lat,
        },
        |b, &(lon, lat, _)| GridBounds {
            min_longitude: b.min_longitude.min(lon),
            max_longitude: b.max_longitude.max(lon),
            min_latitude: b.min_latitude.min(lat),
            max_latitude: b.max_latitude.max(lat),
        },
    );

    let mut buckets: BTreeMap<(usize, usize), Vec<f64>> = BTreeMap::new();
    for (lon, lat, income) in points {
        let row = bin_index(lat, bounds.min_latitude, bounds.max_latitude, bins);
        let column = bin_index(lon, bounds.min_longitude, bounds.max_longitude, bins);
        buckets.entry((row, column)).or_default().push(income);
    }

    let cells = buckets
        .into_iter()
        .filter_map(|((row, column), incomes)| {
            let customers = incomes.len();
            Some(HeatmapCell {
                row,
                column,
                center_latitude: bin_center(row, bounds.min_latitude, bounds.max_latitude, bins),
                center_longitude: bin_center(
                    column,
                    bounds.min_longitude,
                    bounds.max_longitude,
                    bins,
                ),
                customers,
                mean_income: mean_of(incomes)?,
            })
        })
        .collect();

    IncomeHeatmap {
        grid_size: bins,
        bounds: Some(bounds),
        cells,
    }
}

// =============================================================================
// Buyer distances
// =============================================================================

/// Pairwise distances between the highest-income customers.
///
/// `matrix[i][j]` is the Euclidean distance in degrees between customers
/// `rows[i]` and `rows[j]` on (latitude, longitude).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerDistances {
    pub rows: Vec<usize>,
    pub incomes: Vec<f64>,
    pub matrix: Vec<Vec<f64>>,
}

impl BuyerDistances {
    /// Distance between two dataset rows, if both are in the matrix.
    pub fn between(&self, a: usize, b: usize) -> Option<f64> {
        let i = self.rows.iter().position(|&r| r == a)?;
        let j = self.rows.iter().position(|&r| r == b)?;
        Some(self.matrix[i][j])
    }
}

/// Distance matrix for the `top_n` customers by annual income.
///
/// Customers are ranked by income, highest first; equal incomes keep
/// dataset order. Rows missing income or coordinates are not ranked.
pub fn buyer_distances(cols: &CustomerColumns, top_n: usize) -> BuyerDistances {
    let mut ranked: Vec<(usize, f64, f64, f64)> = (0..cols.len())
        .filter_map(|i| Some((i, cols.annual_income[i]?, cols.latitude[i]?, cols.longitude[i]?)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(top_n);

    let matrix = ranked
        .iter()
        .map(|(_, _, lat_a, lon_a)| {
            ranked
                .iter()
                .map(|(_, _, lat_b, lon_b)| (lat_a - lat_b).hypot(lon_a - lon_b))
                .collect()
        })
        .collect();

    BuyerDistances {
        rows: ranked.iter().map(|r| r.0).collect(),
        incomes: ranked.iter().map(|r| r.1).collect(),
        matrix,
    }
}
