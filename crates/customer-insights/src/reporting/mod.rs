//! Report generation module.
//!
//! Saves cleaned datasets and builds [`ImputationReport`]s suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use customer_insights::reporting::ReportGenerator;
//!
//! let generator = ReportGenerator::new("outputs", "clientes");
//! let csv = generator.write_cleaned_csv(&result.data)?;
//! let report = ReportGenerator::build_report("clientes.csv", csv.to_str(), &config, &result);
//! generator.write_report(&report)?;
//! ```

mod generator;

pub use generator::{ImputationReport, ReportGenerator};
