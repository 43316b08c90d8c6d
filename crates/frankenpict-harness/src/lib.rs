//! Tooling around the frankenpict generator.
//!
//! This crate provides:
//! - Model files: JSON descriptions of a generation request
//! - Scenario runner: generate + independently validate a set of models
//! - Coverage matrix: deterministic machine-readable report over a model set
//! - Rendering: JSON / CSV / TSV / table output and parsing rows back
//! - Structured logging: JSONL run logs and SHA-256 artifact indexes

#![forbid(unsafe_code)]

pub mod args;
pub mod coverage_matrix;
pub mod error;
pub mod model;
pub mod render;
pub mod runner;
pub mod structured_log;

pub use coverage_matrix::{CoverageMatrixReport, build_coverage_matrix};
pub use error::{HarnessError, Result};
pub use model::{ModelFile, ModelSet};
pub use render::OutputFormat;
pub use runner::{ScenarioResult, ScenarioRunner, ScenarioStatus};
