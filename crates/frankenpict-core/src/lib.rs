//! Combinatorial (t-wise) test-case generation.
//!
//! Given value counts for N parameters and an interaction order t, build a
//! small set of rows such that every combination of t parameters, at every
//! combination of their values, appears in at least one row.
//!
//! Layers, leaf first:
//! - [`space`]: the parameter space (counts, optional weights).
//! - [`obligation`]: lazy enumeration of everything that must be covered.
//! - [`constraint`]: exclusions and seed rows.
//! - [`submodel`]: parameter groups covered at a higher order.
//! - [`generator`]: seeded greedy construction.
//! - [`validator`]: independent coverage check.
//!
//! ```
//! let rows = frankenpict_core::generate_covering_array(&[2, 3, 3], 2, 0).unwrap();
//! assert!(rows.len() >= 9);
//! ```

#![deny(unsafe_code)]

pub mod array;
pub mod config;
pub mod constraint;
pub mod error;
pub mod generator;
pub mod obligation;
pub mod rng;
pub mod space;
pub mod submodel;
mod tracker;
pub mod validator;

pub use array::{CoveringArray, Row};
pub use config::{GeneratorConfig, RefineMode};
pub use constraint::{Exclusion, ExclusionSet, SeedRow};
pub use error::{CoverError, Result};
pub use generator::{GenerationStats, Generator};
pub use obligation::{Obligation, Obligations, obligation_count, row_count_lower_bound};
pub use rng::SeededRng;
pub use space::{Parameter, ParameterSpace};
pub use submodel::{
    Submodel, obligation_count_with_submodels, row_count_lower_bound_with_submodels,
};
pub use validator::{
    CoverageReport, validate, validate_array, validate_with_exclusions, validate_with_submodels,
};

/// Generate a t-wise covering array with default tuning.
///
/// Each returned row has `value_counts.len()` entries and `row[i]` lies in
/// `0..value_counts[i]`. Identical arguments always produce identical rows.
///
/// # Errors
///
/// `InvalidInput` for empty counts, a zero count, or an order outside
/// `1..=value_counts.len()`; `Overflow` for spaces too large to track.
pub fn generate_covering_array(
    value_counts: &[usize],
    order: usize,
    seed: u64,
) -> Result<Vec<Vec<usize>>> {
    let space = ParameterSpace::new(value_counts)?;
    let array = Generator::new(space, order)?.run(seed)?;
    Ok(array.into_rows())
}
