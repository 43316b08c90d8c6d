//! Independent coverage verification.
//!
//! Re-derives the obligation set from scratch and checks it against a set of
//! rows. Knows nothing about how the rows were produced, so it doubles as the
//! acceptance oracle for arrays from other tools.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::array::CoveringArray;
use crate::constraint::ExclusionSet;
use crate::error::{CoverError, Result};
use crate::obligation::{Combinations, Obligation, ValueTuples};
use crate::space::ParameterSpace;
use crate::submodel::{Submodel, extra_subsets};

/// Upper bound on how many missing obligations a `CoverageGap` carries.
pub const MAX_REPORTED_GAPS: usize = 16;

/// Summary of a successful check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub rows: usize,
    pub order: usize,
    pub obligations_total: u64,
    pub obligations_covered: u64,
    /// Blocked by an exclusion or with no exclusion-free completion.
    pub obligations_excluded: u64,
}

/// Check `rows` against every obligation of `space` at `order`.
///
/// # Errors
///
/// `InvalidInput` for a bad order, `MalformedRow` for a row of the wrong
/// shape, `CoverageGap` if anything is uncovered.
pub fn validate<R: AsRef<[usize]>>(
    rows: &[R],
    space: &ParameterSpace,
    order: usize,
) -> Result<CoverageReport> {
    validate_with_exclusions(rows, space, order, &ExclusionSet::empty(space))
}

/// Validate an array against the counts, order and submodels it records.
///
/// # Errors
///
/// As [`validate_with_submodels`]; also `InvalidInput` if the recorded
/// counts do not form a valid space.
pub fn validate_array(
    array: &CoveringArray,
    exclusions: Option<&ExclusionSet>,
) -> Result<CoverageReport> {
    let space = ParameterSpace::new(array.value_counts())?;
    let none = ExclusionSet::empty(&space);
    validate_with_submodels(
        array.rows(),
        &space,
        array.order(),
        exclusions.unwrap_or(&none),
        array.submodels(),
    )
}

/// [`validate`] under exclusions: excluded combinations must not appear in
/// any row, and obligations that cannot appear in an exclusion-free row are
/// not required.
///
/// # Errors
///
/// As [`validate`], plus `ExcludedRow` when a row contains an exclusion.
pub fn validate_with_exclusions<R: AsRef<[usize]>>(
    rows: &[R],
    space: &ParameterSpace,
    order: usize,
    exclusions: &ExclusionSet,
) -> Result<CoverageReport> {
    validate_with_submodels(rows, space, order, exclusions, &[])
}

/// [`validate_with_exclusions`] where `submodels` add higher-order subsets
/// to the obligation set, exactly as the generator tracks them.
///
/// # Errors
///
/// As [`validate_with_exclusions`], plus `InvalidInput` for a submodel that
/// does not fit `space`.
pub fn validate_with_submodels<R: AsRef<[usize]>>(
    rows: &[R],
    space: &ParameterSpace,
    order: usize,
    exclusions: &ExclusionSet,
    submodels: &[Submodel],
) -> Result<CoverageReport> {
    space.check_order(order)?;
    for submodel in submodels {
        submodel.check(space)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        check_shape(space, idx, row.as_ref())?;
        if let Some(hit) = exclusions.violation(row.as_ref()) {
            return Err(CoverError::ExcludedRow {
                row: idx,
                exclusion: hit.pairs().to_vec(),
            });
        }
    }

    let mut total = 0_u64;
    let mut covered = 0_u64;
    let mut excluded = 0_u64;
    let mut total_missing = 0_u64;
    let mut missing = Vec::new();

    let subsets = Combinations::new(space.len(), order).chain(extra_subsets(order, submodels));
    for positions in subsets {
        let seen: HashSet<Vec<usize>> = rows
            .iter()
            .map(|row| positions.iter().map(|&p| row.as_ref()[p]).collect())
            .collect();
        let radices = positions.iter().map(|&p| space.value_count(p)).collect();
        for values in ValueTuples::new(radices) {
            total += 1;
            if seen.contains(&values) {
                covered += 1;
                continue;
            }
            let obligation = Obligation::new(positions.clone(), values);
            if !exclusions.is_empty() && !is_feasible(space, exclusions, &obligation) {
                excluded += 1;
                continue;
            }
            total_missing += 1;
            if missing.len() < MAX_REPORTED_GAPS {
                missing.push(obligation);
            }
        }
    }

    if total_missing > 0 {
        return Err(CoverError::CoverageGap {
            total_missing,
            missing,
        });
    }
    Ok(CoverageReport {
        rows: rows.len(),
        order,
        obligations_total: total,
        obligations_covered: covered,
        obligations_excluded: excluded,
    })
}

fn check_shape(space: &ParameterSpace, idx: usize, row: &[usize]) -> Result<()> {
    if row.len() != space.len() {
        return Err(CoverError::MalformedRow {
            row: idx,
            reason: format!("has {} values, expected {}", row.len(), space.len()),
        });
    }
    for (p, &v) in row.iter().enumerate() {
        if v >= space.value_count(p) {
            return Err(CoverError::MalformedRow {
                row: idx,
                reason: format!(
                    "value {v} at parameter {p} outside 0..{}",
                    space.value_count(p)
                ),
            });
        }
    }
    Ok(())
}

fn is_feasible(space: &ParameterSpace, exclusions: &ExclusionSet, obligation: &Obligation) -> bool {
    !exclusions.blocks_obligation(obligation)
        && exclusions
            .complete(space, &obligation.to_partial(space.len()))
            .is_some()
}
