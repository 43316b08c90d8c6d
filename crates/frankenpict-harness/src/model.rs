//! Model file loading.

use std::path::{Path, PathBuf};

use frankenpict_core::{
    ExclusionSet, Generator, GeneratorConfig, ParameterSpace, SeedRow, Submodel,
};
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

fn default_order() -> usize {
    2
}

/// One generation request as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFile {
    /// Scenario identifier.
    pub name: String,
    /// Values per parameter. Signed so that negative counts reach the
    /// generator and fail as invalid input instead of as a JSON error.
    pub value_counts: Vec<i64>,
    #[serde(default = "default_order")]
    pub order: usize,
    #[serde(default)]
    pub seed: u64,
    /// Each exclusion is a list of `[position, value]` pairs.
    #[serde(default)]
    pub exclusions: Vec<Vec<(usize, usize)>>,
    /// Partial rows; `null` marks a free position.
    #[serde(default)]
    pub seed_rows: Vec<Vec<Option<usize>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<Vec<u32>>>,
    /// Parameter groups covered above `order`, as `{"positions", "order"}`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submodels: Vec<Submodel>,
    /// Error code the scenario is expected to fail with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_error: Option<String>,
}

impl ModelFile {
    /// Minimal model: counts and order, seed 0, no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, value_counts: &[i64], order: usize) -> Self {
        Self {
            name: name.into(),
            value_counts: value_counts.to_vec(),
            order,
            seed: 0,
            exclusions: Vec::new(),
            seed_rows: Vec::new(),
            weights: None,
            submodels: Vec::new(),
            expect_error: None,
        }
    }

    /// Load model from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize model to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load model from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::from_json(&content).map_err(|err| HarnessError::Model {
            name: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    pub fn space(&self) -> Result<ParameterSpace> {
        let space = ParameterSpace::from_signed(&self.value_counts)?;
        match &self.weights {
            Some(weights) => Ok(space.with_weights(weights.clone())?),
            None => Ok(space),
        }
    }

    pub fn exclusion_set(&self) -> Result<ExclusionSet> {
        Ok(ExclusionSet::new(&self.space()?, &self.exclusions)?)
    }

    /// Configured generator for this model. Input errors in the model
    /// surface here, before any generation work.
    pub fn generator(&self, config: GeneratorConfig) -> Result<Generator> {
        let seed_rows = self.seed_rows.iter().cloned().map(SeedRow::new).collect();
        let mut generator = Generator::new(self.space()?, self.order)?
            .with_exclusions(&self.exclusions)?
            .with_seed_rows(seed_rows)
            .with_config(config);
        for submodel in &self.submodels {
            generator = generator.with_submodel(submodel.positions(), submodel.order())?;
        }
        Ok(generator)
    }
}

/// Every model in a directory.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    pub models: Vec<ModelFile>,
}

impl ModelSet {
    /// Load every `*.json` file in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| HarnessError::io(dir, e))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let models = paths
            .iter()
            .map(|path| ModelFile::from_file(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { models })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
