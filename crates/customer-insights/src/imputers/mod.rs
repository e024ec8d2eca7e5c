//! Imputation module for handling missing values.
//!
//! This module provides:
//! - Grouped aggregation primitives (mean and mode per key)
//! - The customer fill cascade built on top of them

mod cascade;
pub mod grouped;

pub use cascade::CustomerImputer;
