//! Grouped aggregation primitives.
//!
//! Groups are keyed by the value of another column. Rows whose key is
//! missing never form a group, and groups without any known value produce
//! no aggregate, so callers fall through to a wider statistic.

use crate::utils::{mean_of, mode_of};
use std::collections::BTreeMap;

/// Grouping key for exact numeric values.
///
/// Wraps the bit pattern of the float so numeric columns can key a
/// `BTreeMap`. `-0.0` is folded into `0.0`; NaN never forms a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericKey(u64);

impl NumericKey {
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        let normalized = if value == 0.0 { 0.0 } else { value };
        Some(Self(normalized.to_bits()))
    }
}

/// Borrow a categorical column as grouping keys.
pub fn text_keys(column: &[Option<String>]) -> Vec<Option<&str>> {
    column.iter().map(|v| v.as_deref()).collect()
}

/// Convert a numeric column into grouping keys.
pub fn numeric_keys(column: &[Option<f64>]) -> Vec<Option<NumericKey>> {
    column
        .iter()
        .map(|v| v.and_then(NumericKey::new))
        .collect()
}

/// Mean of `values` per key, over rows where both key and value are known.
pub fn group_means<K: Ord + Copy>(
    keys: &[Option<K>],
    values: &[Option<f64>],
) -> BTreeMap<K, f64> {
    let mut buckets: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (key, value) in keys.iter().zip(values) {
        if let (Some(key), Some(value)) = (key, value) {
            buckets.entry(*key).or_default().push(*value);
        }
    }

    buckets
        .into_iter()
        .filter_map(|(key, vals)| mean_of(vals).map(|m| (key, m)))
        .collect()
}

/// Mode of `values` per key, over rows where both key and value are known.
///
/// Ties resolve to the lexicographically smallest value.
pub fn group_modes<K: Ord + Copy>(
    keys: &[Option<K>],
    values: &[Option<String>],
) -> BTreeMap<K, String> {
    let mut buckets: BTreeMap<K, Vec<&str>> = BTreeMap::new();
    for (key, value) in keys.iter().zip(values) {
        if let (Some(key), Some(value)) = (key, value) {
            buckets.entry(*key).or_default().push(value.as_str());
        }
    }

    buckets
        .into_iter()
        .filter_map(|(key, vals)| mode_of(vals).map(|m| (key, m)))
        .collect()
}

/// Fill missing values from their row's group aggregate.
///
/// Returns the number of values filled. Rows whose key is missing or whose
/// group has no aggregate stay missing.
pub fn fill_from_groups<K: Ord, V: Clone>(
    keys: &[Option<K>],
    values: &mut [Option<V>],
    groups: &BTreeMap<K, V>,
) -> usize {
    let mut filled = 0;
    for (key, slot) in keys.iter().zip(values.iter_mut()) {
        if slot.is_some() {
            continue;
        }
        if let Some(aggregate) = key.as_ref().and_then(|k| groups.get(k)) {
            *slot = Some(aggregate.clone());
            filled += 1;
        }
    }
    filled
}

/// Fill every missing value with `value`. Returns the number filled.
pub fn fill_constant<V: Clone>(values: &mut [Option<V>], value: &V) -> usize {
    let mut filled = 0;
    for slot in values.iter_mut().filter(|v| v.is_none()) {
        *slot = Some(value.clone());
        filled += 1;
    }
    filled
}

/// Known values of a numeric column.
pub fn known_numbers(values: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().flatten().copied()
}

/// Known values of a categorical column.
pub fn known_labels(values: &[Option<String>]) -> impl Iterator<Item = &str> + '_ {
    values.iter().flatten().map(String::as_str)
}
