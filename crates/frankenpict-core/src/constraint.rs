//! Exclusions and seed rows.
//!
//! Exclusions are partial assignments that must never appear in a generated
//! row. Seed rows are partial assignments the caller wants emitted first.

use serde::{Deserialize, Serialize};

use crate::error::{CoverError, Result};
use crate::obligation::Obligation;
use crate::space::ParameterSpace;

/// A forbidden partial assignment. Pairs are sorted by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Exclusion {
    pairs: Vec<(usize, usize)>,
}

impl Exclusion {
    /// # Errors
    ///
    /// `InvalidInput` if `pairs` is empty, repeats a position, or names a
    /// position or value outside `space`.
    pub fn new(space: &ParameterSpace, pairs: &[(usize, usize)]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(CoverError::invalid("exclusion must name at least one value"));
        }
        let mut sorted = pairs.to_vec();
        sorted.sort_unstable();
        for w in sorted.windows(2) {
            if w[0].0 == w[1].0 {
                return Err(CoverError::invalid(format!(
                    "exclusion binds parameter {} twice",
                    w[0].0
                )));
            }
        }
        for &(p, v) in &sorted {
            if p >= space.len() {
                return Err(CoverError::invalid(format!(
                    "exclusion names parameter {p}, space has {}",
                    space.len()
                )));
            }
            if v >= space.value_count(p) {
                return Err(CoverError::invalid(format!(
                    "exclusion value {v} out of range for parameter {p}"
                )));
            }
        }
        Ok(Self { pairs: sorted })
    }

    #[must_use]
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    #[must_use]
    pub fn matches_row(&self, row: &[usize]) -> bool {
        self.pairs.iter().all(|&(p, v)| row.get(p) == Some(&v))
    }

    /// Every term is bound in `partial` with the excluded value.
    #[must_use]
    pub fn matches_partial(&self, partial: &[Option<usize>]) -> bool {
        self.pairs
            .iter()
            .all(|&(p, v)| partial.get(p).copied().flatten() == Some(v))
    }

    /// `self` is a subset of `other`, so `other` is redundant.
    fn subsumes(&self, other: &Self) -> bool {
        self.pairs.len() <= other.pairs.len()
            && self.pairs.iter().all(|pair| other.pairs.contains(pair))
    }
}

/// Normalized collection of exclusions with a per-position index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    exclusions: Vec<Exclusion>,
    by_position: Vec<Vec<usize>>,
}

impl ExclusionSet {
    /// No exclusions at all.
    #[must_use]
    pub fn empty(space: &ParameterSpace) -> Self {
        Self {
            exclusions: Vec::new(),
            by_position: vec![Vec::new(); space.len()],
        }
    }

    /// Validate and normalize. Duplicates are dropped, as is any exclusion
    /// that contains a smaller one.
    ///
    /// # Errors
    ///
    /// `InvalidInput` from [`Exclusion::new`].
    pub fn new(space: &ParameterSpace, raw: &[Vec<(usize, usize)>]) -> Result<Self> {
        let mut parsed = raw
            .iter()
            .map(|pairs| Exclusion::new(space, pairs))
            .collect::<Result<Vec<_>>>()?;
        parsed.sort_by(|a, b| a.pairs.len().cmp(&b.pairs.len()).then_with(|| a.cmp(b)));
        parsed.dedup();

        let mut kept: Vec<Exclusion> = Vec::with_capacity(parsed.len());
        for candidate in parsed {
            if !kept.iter().any(|k| k.subsumes(&candidate)) {
                kept.push(candidate);
            }
        }

        let mut by_position = vec![Vec::new(); space.len()];
        for (idx, exclusion) in kept.iter().enumerate() {
            for &(p, _) in &exclusion.pairs {
                by_position[p].push(idx);
            }
        }
        Ok(Self {
            exclusions: kept,
            by_position,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exclusions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exclusions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exclusion> {
        self.exclusions.iter()
    }

    /// First exclusion the full row hits, if any.
    #[must_use]
    pub fn violation(&self, row: &[usize]) -> Option<&Exclusion> {
        self.exclusions.iter().find(|e| e.matches_row(row))
    }

    #[must_use]
    pub fn blocks_partial(&self, partial: &[Option<usize>]) -> bool {
        self.exclusions.iter().any(|e| e.matches_partial(partial))
    }

    /// Like [`Self::blocks_partial`] but only checks exclusions that touch
    /// `position`. Enough after a single assignment.
    #[must_use]
    pub fn blocks_at(&self, partial: &[Option<usize>], position: usize) -> bool {
        self.by_position
            .get(position)
            .is_some_and(|idxs| idxs.iter().any(|&i| self.exclusions[i].matches_partial(partial)))
    }

    /// Full-row variant of [`Self::blocks_at`].
    #[must_use]
    pub fn row_blocked_at(&self, row: &[usize], position: usize) -> bool {
        self.by_position
            .get(position)
            .is_some_and(|idxs| idxs.iter().any(|&i| self.exclusions[i].matches_row(row)))
    }

    /// An exclusion is contained in the obligation, so no row can satisfy it.
    #[must_use]
    pub fn blocks_obligation(&self, obligation: &Obligation) -> bool {
        self.exclusions.iter().any(|e| {
            e.pairs.iter().all(|&(p, v)| {
                obligation
                    .positions()
                    .iter()
                    .position(|&op| op == p)
                    .is_some_and(|i| obligation.values()[i] == v)
            })
        })
    }

    /// Smallest (lexicographic over free positions) exclusion-free full row
    /// extending `partial`, or `None` if there is none.
    #[must_use]
    pub fn complete(&self, space: &ParameterSpace, partial: &[Option<usize>]) -> Option<Vec<usize>> {
        if partial.len() != space.len() || self.blocks_partial(partial) {
            return None;
        }
        let free: Vec<usize> = (0..partial.len()).filter(|&p| partial[p].is_none()).collect();
        let mut work = partial.to_vec();
        if self.fill(space, &mut work, &free, 0) {
            work.into_iter().collect()
        } else {
            None
        }
    }

    fn fill(
        &self,
        space: &ParameterSpace,
        work: &mut [Option<usize>],
        free: &[usize],
        depth: usize,
    ) -> bool {
        let Some(&position) = free.get(depth) else {
            return true;
        };
        for value in 0..space.value_count(position) {
            work[position] = Some(value);
            if !self.blocks_at(work, position) && self.fill(space, work, free, depth + 1) {
                return true;
            }
        }
        work[position] = None;
        false
    }
}

/// A partial row the caller wants in the output. `None` positions are free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedRow {
    values: Vec<Option<usize>>,
}

impl SeedRow {
    #[must_use]
    pub fn new(values: Vec<Option<usize>>) -> Self {
        Self { values }
    }

    /// Seed row binding only the given positions.
    #[must_use]
    pub fn from_pairs(width: usize, pairs: &[(usize, usize)]) -> Self {
        let mut values = vec![None; width];
        for &(p, v) in pairs {
            if p < width {
                values[p] = Some(v);
            }
        }
        Self { values }
    }

    #[must_use]
    pub fn values(&self) -> &[Option<usize>] {
        &self.values
    }

    /// # Errors
    ///
    /// `InvalidInput` on wrong width, out-of-range values, or when the seed
    /// itself cannot be completed without hitting an exclusion.
    pub fn check(&self, space: &ParameterSpace, exclusions: &ExclusionSet) -> Result<()> {
        if self.values.len() != space.len() {
            return Err(CoverError::invalid(format!(
                "seed row has {} values, space has {} parameters",
                self.values.len(),
                space.len()
            )));
        }
        for (p, v) in self.values.iter().enumerate() {
            if let Some(v) = *v
                && v >= space.value_count(p)
            {
                return Err(CoverError::invalid(format!(
                    "seed value {v} out of range for parameter {p}"
                )));
            }
        }
        if exclusions.complete(space, &self.values).is_none() {
            return Err(CoverError::invalid(
                "seed row conflicts with the exclusions",
            ));
        }
        Ok(())
    }
}
