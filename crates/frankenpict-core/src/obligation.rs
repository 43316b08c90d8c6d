//! Obligation enumeration.
//!
//! An obligation is one t-subset of parameter positions bound to one value
//! per position. The full set is the union over every t-subset (lexicographic
//! order) of the Cartesian product of the chosen value ranges (odometer order,
//! last position fastest). Everything here is lazy: the set can be very large
//! and callers usually only need to stream it once.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoverError, Result};
use crate::space::ParameterSpace;

/// A partial assignment of exactly `t` parameters.
///
/// Positions are kept strictly ascending so structural equality is set
/// equality of the (position, value) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Obligation {
    positions: Vec<usize>,
    values: Vec<usize>,
}

impl Obligation {
    /// Build from parallel slices. `positions` must be strictly ascending.
    #[must_use]
    pub(crate) fn new(positions: Vec<usize>, values: Vec<usize>) -> Self {
        debug_assert_eq!(positions.len(), values.len());
        debug_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        Self { positions, values }
    }

    /// Build from (position, value) pairs in any order.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `pairs` is empty or two pairs share a position.
    pub fn from_pairs(pairs: &[(usize, usize)]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(CoverError::invalid("obligation binds no parameters"));
        }
        let mut sorted = pairs.to_vec();
        sorted.sort_unstable();
        if let Some(w) = sorted.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(CoverError::invalid(format!(
                "obligation binds parameter {} twice",
                w[0].0
            )));
        }
        let (positions, values) = sorted.into_iter().unzip();
        Ok(Self { positions, values })
    }

    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[must_use]
    pub fn values(&self) -> &[usize] {
        &self.values
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.positions.len()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.positions.iter().copied().zip(self.values.iter().copied())
    }

    /// True if `row` assigns every bound position its bound value.
    #[must_use]
    pub fn is_satisfied_by(&self, row: &[usize]) -> bool {
        self.pairs().all(|(p, v)| row.get(p) == Some(&v))
    }

    /// Expand into a partial row of length `width`.
    #[must_use]
    pub fn to_partial(&self, width: usize) -> Vec<Option<usize>> {
        let mut partial = vec![None; width];
        for (p, v) in self.pairs() {
            partial[p] = Some(v);
        }
        partial
    }
}

impl fmt::Display for Obligation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (p, v)) in self.pairs().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "p{p}={v}")?;
        }
        f.write_str("}")
    }
}

/// Lazy lexicographic `k`-subsets of `0..n`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Combinations {
    /// Empty when `k == 0` or `k > n`.
    #[must_use]
    pub fn new(n: usize, k: usize) -> Self {
        let current = (k > 0 && k <= n).then(|| (0..k).collect());
        Self { n, current }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.current.clone()?;
        let k = out.len();
        let cur = self.current.as_mut()?;
        // Rightmost slot that can still move right.
        match (0..k).rev().find(|&i| cur[i] < self.n - k + i) {
            Some(i) => {
                cur[i] += 1;
                for j in i + 1..k {
                    cur[j] = cur[j - 1] + 1;
                }
            }
            None => self.current = None,
        }
        Some(out)
    }
}

/// Lazy odometer over `0..radices[0] x 0..radices[1] x ...`, last digit fastest.
#[derive(Debug, Clone)]
pub struct ValueTuples {
    radices: Vec<usize>,
    current: Option<Vec<usize>>,
}

impl ValueTuples {
    #[must_use]
    pub fn new(radices: Vec<usize>) -> Self {
        let current = (!radices.is_empty() && radices.iter().all(|&r| r > 0))
            .then(|| vec![0; radices.len()]);
        Self { radices, current }
    }
}

impl Iterator for ValueTuples {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.current.clone()?;
        let cur = self.current.as_mut()?;
        let mut i = cur.len();
        loop {
            if i == 0 {
                self.current = None;
                break;
            }
            i -= 1;
            cur[i] += 1;
            if cur[i] < self.radices[i] {
                break;
            }
            cur[i] = 0;
        }
        Some(out)
    }
}

/// The full obligation set of a space at a given order, as a lazy sequence.
///
/// Restartable: clone it before iterating, or call [`Obligations::new`] again.
#[derive(Debug, Clone)]
pub struct Obligations<'a> {
    space: &'a ParameterSpace,
    subsets: Combinations,
    active: Option<(Vec<usize>, ValueTuples)>,
}

impl<'a> Obligations<'a> {
    /// # Errors
    ///
    /// `InvalidInput` if `order` is zero or exceeds the parameter count.
    pub fn new(space: &'a ParameterSpace, order: usize) -> Result<Self> {
        space.check_order(order)?;
        Ok(Self {
            space,
            subsets: Combinations::new(space.len(), order),
            active: None,
        })
    }
}

impl Iterator for Obligations<'_> {
    type Item = Obligation;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((positions, tuples)) = self.active.as_mut()
                && let Some(values) = tuples.next()
            {
                return Some(Obligation::new(positions.clone(), values));
            }
            let positions = self.subsets.next()?;
            let radices = positions.iter().map(|&p| self.space.value_count(p)).collect();
            self.active = Some((positions, ValueTuples::new(radices)));
        }
    }
}

/// Σ over t-subsets of Π value counts, computed without enumerating subsets.
///
/// # Errors
///
/// `InvalidInput` for a bad order; `Overflow` if the count does not fit in
/// `u128`.
pub fn obligation_count(space: &ParameterSpace, order: usize) -> Result<u128> {
    space.check_order(order)?;
    // Elementary symmetric polynomial e_t of the counts.
    let mut dp = vec![0_u128; order + 1];
    dp[0] = 1;
    for &count in space.value_counts() {
        let count = count as u128;
        for j in (1..=order).rev() {
            let term = dp[j - 1].checked_mul(count).ok_or(CoverError::Overflow {
                obligations: u128::MAX,
                limit: u64::MAX,
            })?;
            dp[j] = dp[j].checked_add(term).ok_or(CoverError::Overflow {
                obligations: u128::MAX,
                limit: u64::MAX,
            })?;
        }
    }
    Ok(dp[order])
}

/// Smallest row count any covering array of this order could have: the
/// largest Π value count over all t-subsets.
///
/// # Errors
///
/// `InvalidInput` for a bad order.
pub fn row_count_lower_bound(space: &ParameterSpace, order: usize) -> Result<u128> {
    space.check_order(order)?;
    let mut counts = space.value_counts().to_vec();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    Ok(counts
        .iter()
        .take(order)
        .fold(1_u128, |acc, &c| acc.saturating_mul(c as u128)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_are_lexicographic() {
        let got: Vec<_> = Combinations::new(4, 2).collect();
        assert_eq!(
            got,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(Combinations::new(3, 3).count(), 1);
        assert_eq!(Combinations::new(3, 0).count(), 0);
        assert_eq!(Combinations::new(2, 3).count(), 0);
    }

    #[test]
    fn value_tuples_odometer() {
        let got: Vec<_> = ValueTuples::new(vec![2, 3]).collect();
        assert_eq!(got.len(), 6);
        assert_eq!(got[0], vec![0, 0]);
        assert_eq!(got[1], vec![0, 1]);
        assert_eq!(got[3], vec![1, 0]);
        assert_eq!(got[5], vec![1, 2]);
    }

    #[test]
    fn two_binary_parameters_have_four_pair_obligations() {
        let space = ParameterSpace::new(&[2, 2]).unwrap();
        let all: Vec<_> = Obligations::new(&space, 2).unwrap().collect();
        assert_eq!(all.len(), 4);
        assert_eq!(obligation_count(&space, 2).unwrap(), 4);
        assert_eq!(all[0], Obligation::from_pairs(&[(0, 0), (1, 0)]).unwrap());
        assert_eq!(all[3], Obligation::from_pairs(&[(1, 1), (0, 1)]).unwrap());
    }

    #[test]
    fn three_ternary_parameters_have_27_pair_obligations() {
        let space = ParameterSpace::new(&[3, 3, 3]).unwrap();
        assert_eq!(Obligations::new(&space, 2).unwrap().count(), 27);
        assert_eq!(obligation_count(&space, 2).unwrap(), 27);
    }

    #[test]
    fn closed_form_count_matches_enumeration() {
        let space = ParameterSpace::new(&[1, 3, 3, 4, 2]).unwrap();
        for order in 1..=5 {
            let streamed = Obligations::new(&space, order).unwrap().count() as u128;
            assert_eq!(obligation_count(&space, order).unwrap(), streamed, "t={order}");
        }
    }

    #[test]
    fn enumeration_is_restartable() {
        let space = ParameterSpace::new(&[2, 3, 2]).unwrap();
        let seq = Obligations::new(&space, 2).unwrap();
        let first: Vec<_> = seq.clone().collect();
        let second: Vec<_> = seq.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn bad_orders_are_rejected() {
        let space = ParameterSpace::new(&[2, 2]).unwrap();
        assert!(matches!(
            Obligations::new(&space, 0),
            Err(CoverError::InvalidInput { .. })
        ));
        assert!(matches!(
            obligation_count(&space, 3),
            Err(CoverError::InvalidInput { .. })
        ));
    }

    #[test]
    fn huge_spaces_overflow_instead_of_wrapping() {
        let counts = vec![usize::MAX; 8];
        let space = ParameterSpace::new(&counts).unwrap();
        assert!(matches!(
            obligation_count(&space, 8),
            Err(CoverError::Overflow { .. })
        ));
    }

    #[test]
    fn lower_bound_uses_largest_counts() {
        let space = ParameterSpace::new(&[1, 3, 3, 4]).unwrap();
        assert_eq!(row_count_lower_bound(&space, 2).unwrap(), 12);
        assert_eq!(row_count_lower_bound(&space, 3).unwrap(), 36);
        assert_eq!(row_count_lower_bound(&space, 1).unwrap(), 4);
    }

    #[test]
    fn satisfaction_and_display() {
        let ob = Obligation::from_pairs(&[(2, 1), (0, 0)]).unwrap();
        assert!(ob.is_satisfied_by(&[0, 5, 1]));
        assert!(!ob.is_satisfied_by(&[0, 5, 0]));
        assert!(!ob.is_satisfied_by(&[0]));
        assert_eq!(ob.to_string(), "{p0=0, p2=1}");
        assert_eq!(ob.to_partial(3), vec![Some(0), None, Some(1)]);
    }

    #[test]
    fn repeated_or_missing_positions_are_invalid() {
        assert!(matches!(
            Obligation::from_pairs(&[(1, 0), (1, 1)]),
            Err(CoverError::InvalidInput { ref reason }) if reason.contains("parameter 1 twice")
        ));
        assert!(matches!(
            Obligation::from_pairs(&[]),
            Err(CoverError::InvalidInput { .. })
        ));
    }
}
