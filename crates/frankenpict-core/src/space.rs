//! Parameter space model.

use serde::{Deserialize, Serialize};

use crate::error::{CoverError, Result};

/// One input dimension: its position and how many values it can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub position: usize,
    pub value_count: usize,
}

/// Ordered, immutable set of parameters for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpace {
    counts: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weights: Option<Vec<Vec<u32>>>,
}

impl ParameterSpace {
    /// Build a space from per-parameter value counts.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `counts` is empty or any count is zero.
    pub fn new(counts: &[usize]) -> Result<Self> {
        if counts.is_empty() {
            return Err(CoverError::invalid("must have at least one parameter"));
        }
        if let Some(position) = counts.iter().position(|&c| c == 0) {
            return Err(CoverError::invalid(format!(
                "parameter {position} has no values"
            )));
        }
        Ok(Self {
            counts: counts.to_vec(),
            weights: None,
        })
    }

    /// Build a space from signed counts, rejecting negatives.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `counts` is empty or any count is `<= 0`.
    pub fn from_signed(counts: &[i64]) -> Result<Self> {
        let mut converted = Vec::with_capacity(counts.len());
        for (position, &count) in counts.iter().enumerate() {
            if count < 0 {
                return Err(CoverError::invalid(format!(
                    "parameter {position} has negative value count {count}"
                )));
            }
            let count = usize::try_from(count).map_err(|_| {
                CoverError::invalid(format!("parameter {position} value count too large"))
            })?;
            converted.push(count);
        }
        Self::new(&converted)
    }

    /// Attach per-value weights. Weights bias the random fill of free
    /// positions; they never change what must be covered.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the shape does not match the space or a weight is 0.
    pub fn with_weights(mut self, weights: Vec<Vec<u32>>) -> Result<Self> {
        if weights.len() != self.counts.len() {
            return Err(CoverError::invalid(format!(
                "expected weights for {} parameters, got {}",
                self.counts.len(),
                weights.len()
            )));
        }
        for (position, (w, &count)) in weights.iter().zip(&self.counts).enumerate() {
            if w.len() != count {
                return Err(CoverError::invalid(format!(
                    "parameter {position} has {count} values but {} weights",
                    w.len()
                )));
            }
            if w.contains(&0) {
                return Err(CoverError::invalid(format!(
                    "parameter {position} has a zero weight"
                )));
            }
        }
        self.weights = Some(weights);
        Ok(self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Always false for a constructed space; present for clippy's sake.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Value count at `position`.
    ///
    /// # Panics
    ///
    /// If `position` is out of bounds.
    #[must_use]
    pub fn value_count(&self, position: usize) -> usize {
        self.counts[position]
    }

    #[must_use]
    pub fn value_counts(&self) -> &[usize] {
        &self.counts
    }

    /// Weights for `position`, if any were attached.
    #[must_use]
    pub fn weights(&self, position: usize) -> Option<&[u32]> {
        self.weights.as_ref().map(|w| w[position].as_slice())
    }

    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(position, &value_count)| Parameter {
                position,
                value_count,
            })
    }

    /// Check an interaction order against this space.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `order` is zero or exceeds the parameter count.
    pub fn check_order(&self, order: usize) -> Result<()> {
        if order == 0 {
            return Err(CoverError::invalid("order must be at least 1"));
        }
        if order > self.counts.len() {
            return Err(CoverError::invalid(format!(
                "order {order} exceeds parameter count {}",
                self.counts.len()
            )));
        }
        Ok(())
    }

    /// True when `row` has the right length and every value is in range.
    #[must_use]
    pub fn admits(&self, row: &[usize]) -> bool {
        row.len() == self.counts.len() && row.iter().zip(&self.counts).all(|(&v, &c)| v < c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_zero_counts() {
        assert!(matches!(
            ParameterSpace::new(&[]),
            Err(CoverError::InvalidInput { .. })
        ));
        let err = ParameterSpace::new(&[2, 0, 3]).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: parameter 1 has no values");
    }

    #[test]
    fn signed_constructor_rejects_negative() {
        let err = ParameterSpace::from_signed(&[2, -1]).unwrap_err();
        assert!(err.to_string().contains("negative"));
        let space = ParameterSpace::from_signed(&[1, 3, 3, 4]).unwrap();
        assert_eq!(space.value_counts(), &[1, 3, 3, 4]);
    }

    #[test]
    fn order_bounds() {
        let space = ParameterSpace::new(&[2, 2, 2]).unwrap();
        assert!(space.check_order(0).is_err());
        assert!(space.check_order(1).is_ok());
        assert!(space.check_order(3).is_ok());
        assert!(space.check_order(4).is_err());
    }

    #[test]
    fn weights_must_match_shape() {
        let space = ParameterSpace::new(&[2, 3]).unwrap();
        assert!(space.clone().with_weights(vec![vec![1, 1]]).is_err());
        assert!(
            space
                .clone()
                .with_weights(vec![vec![1, 1], vec![1, 0, 1]])
                .is_err()
        );
        let weighted = space.with_weights(vec![vec![5, 1], vec![1, 1, 1]]).unwrap();
        assert_eq!(weighted.weights(0), Some(&[5, 1][..]));
    }

    #[test]
    fn admits_checks_shape_and_range() {
        let space = ParameterSpace::new(&[2, 3]).unwrap();
        assert!(space.admits(&[1, 2]));
        assert!(!space.admits(&[2, 0]));
        assert!(!space.admits(&[0]));
    }

    #[test]
    fn parameters_report_positions() {
        let space = ParameterSpace::new(&[4, 1]).unwrap();
        let params: Vec<_> = space.parameters().collect();
        assert_eq!(
            params,
            vec![
                Parameter {
                    position: 0,
                    value_count: 4
                },
                Parameter {
                    position: 1,
                    value_count: 1
                },
            ]
        );
    }
}
