//! Mixed-strength submodels.
//!
//! A submodel raises the interaction order over a group of parameters: every
//! `order`-subset of its positions must be covered at every value combination,
//! on top of the model's own t-subsets. A submodel whose order does not exceed
//! the model order adds nothing, since each of its subsets already sits inside
//! some model t-subset.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoverError, Result};
use crate::obligation::{Combinations, obligation_count, row_count_lower_bound};
use crate::space::ParameterSpace;

/// A parameter group covered at its own order. Positions are strictly
/// ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Submodel {
    positions: Vec<usize>,
    order: usize,
}

impl Submodel {
    /// # Errors
    ///
    /// `InvalidInput` if `positions` is empty, repeats a position, names one
    /// outside `space`, or `order` is outside `1..=positions.len()`.
    pub fn new(space: &ParameterSpace, positions: &[usize], order: usize) -> Result<Self> {
        let mut sorted = positions.to_vec();
        sorted.sort_unstable();
        let submodel = Self {
            positions: sorted,
            order,
        };
        submodel.check(space)?;
        Ok(submodel)
    }

    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Re-check against `space`; deserialized submodels skip [`Self::new`].
    ///
    /// # Errors
    ///
    /// As [`Self::new`].
    pub fn check(&self, space: &ParameterSpace) -> Result<()> {
        if self.positions.is_empty() {
            return Err(CoverError::invalid("submodel has no parameters"));
        }
        if let Some(w) = self.positions.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CoverError::invalid(format!(
                "submodel positions must be distinct and ascending, got {} then {}",
                w[0], w[1]
            )));
        }
        if let Some(&p) = self.positions.iter().find(|&&p| p >= space.len()) {
            return Err(CoverError::invalid(format!(
                "submodel names parameter {p}, space has {}",
                space.len()
            )));
        }
        if self.order == 0 || self.order > self.positions.len() {
            return Err(CoverError::invalid(format!(
                "submodel order {} outside 1..={}",
                self.order,
                self.positions.len()
            )));
        }
        Ok(())
    }

    fn subsets(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        Combinations::new(self.positions.len(), self.order)
            .map(|idx| idx.into_iter().map(|i| self.positions[i]).collect())
    }
}

/// Position subsets the submodels add to a model of `order`: distinct, in
/// lexicographic order, each larger than `order`.
#[must_use]
pub fn extra_subsets(order: usize, submodels: &[Submodel]) -> Vec<Vec<usize>> {
    submodels
        .iter()
        .filter(|s| s.order > order)
        .flat_map(|s| s.subsets())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// [`obligation_count`] plus the obligations the submodels add.
///
/// # Errors
///
/// As [`obligation_count`].
pub fn obligation_count_with_submodels(
    space: &ParameterSpace,
    order: usize,
    submodels: &[Submodel],
) -> Result<u128> {
    let overflow = || CoverError::Overflow {
        obligations: u128::MAX,
        limit: u64::MAX,
    };
    let mut total = obligation_count(space, order)?;
    for positions in extra_subsets(order, submodels) {
        let cells = positions.iter().try_fold(1_u128, |acc, &p| {
            acc.checked_mul(space.value_count(p) as u128)
        });
        total = cells
            .and_then(|cells| total.checked_add(cells))
            .ok_or_else(overflow)?;
    }
    Ok(total)
}

/// [`row_count_lower_bound`], raised by any submodel subset with a larger
/// value product.
///
/// # Errors
///
/// `InvalidInput` for a bad order.
pub fn row_count_lower_bound_with_submodels(
    space: &ParameterSpace,
    order: usize,
    submodels: &[Submodel],
) -> Result<u128> {
    let base = row_count_lower_bound(space, order)?;
    Ok(extra_subsets(order, submodels)
        .iter()
        .map(|positions| {
            positions
                .iter()
                .fold(1_u128, |acc, &p| acc.saturating_mul(space.value_count(p) as u128))
        })
        .fold(base, u128::max))
}
