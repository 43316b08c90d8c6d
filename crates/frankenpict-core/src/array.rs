//! Generated rows and the covering array that owns them.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::submodel::Submodel;

/// One full assignment: `row[i]` is the value index of parameter `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Vec<usize>);

impl Row {
    #[must_use]
    pub fn new(values: Vec<usize>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

impl Deref for Row {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl AsRef<[usize]> for Row {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Row {
    fn from(values: Vec<usize>) -> Self {
        Self(values)
    }
}

/// Rows in generation order plus the inputs that produced them.
///
/// Row order carries no coverage meaning; it is kept so identical inputs
/// produce byte-identical output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveringArray {
    value_counts: Vec<usize>,
    order: usize,
    seed: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    submodels: Vec<Submodel>,
    rows: Vec<Row>,
}

impl CoveringArray {
    #[must_use]
    pub fn new(value_counts: Vec<usize>, order: usize, seed: u64, rows: Vec<Row>) -> Self {
        Self {
            value_counts,
            order,
            seed,
            submodels: Vec::new(),
            rows,
        }
    }

    /// Record the submodels the rows were generated for.
    #[must_use]
    pub fn with_submodels(mut self, submodels: Vec<Submodel>) -> Self {
        self.submodels = submodels;
        self
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn value_counts(&self) -> &[usize] {
        &self.value_counts
    }

    #[must_use]
    pub fn submodels(&self) -> &[Submodel] {
        &self.submodels
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<usize>> {
        self.rows.into_iter().map(Row::into_inner).collect()
    }

    /// BLAKE3 digest over counts, order, submodels and rows (seed excluded,
    /// so two seeds that happen to produce the same rows share a fingerprint).
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"frankenpict.array.v1");
        hash_len(&mut hasher, self.value_counts.len());
        for &c in &self.value_counts {
            hash_len(&mut hasher, c);
        }
        hash_len(&mut hasher, self.order);
        if !self.submodels.is_empty() {
            hasher.update(b"submodels");
            hash_len(&mut hasher, self.submodels.len());
            for submodel in &self.submodels {
                hash_len(&mut hasher, submodel.order());
                hash_len(&mut hasher, submodel.positions().len());
                for &p in submodel.positions() {
                    hash_len(&mut hasher, p);
                }
            }
        }
        hash_len(&mut hasher, self.rows.len());
        for row in &self.rows {
            for &v in row.as_slice() {
                hash_len(&mut hasher, v);
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

fn hash_len(hasher: &mut blake3::Hasher, v: usize) {
    hasher.update(&(v as u64).to_le_bytes());
}
