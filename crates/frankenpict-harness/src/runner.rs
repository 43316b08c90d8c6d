//! Scenario execution engine.

use std::time::Instant;

use frankenpict_core::{
    GenerationStats, GeneratorConfig, row_count_lower_bound_with_submodels, validate_array,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ModelFile, ModelSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pass,
    /// Generation succeeded but the output did not validate, or a scenario
    /// expecting an error did not get it.
    Fail,
    /// Generation failed unexpectedly.
    Error,
}

impl ScenarioStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Error => "error",
        }
    }
}

/// Outcome of one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub value_counts: Vec<i64>,
    pub order: usize,
    pub seed: u64,
    pub status: ScenarioStatus,
    pub rows: Option<usize>,
    pub lower_bound: Option<u64>,
    pub fingerprint: Option<String>,
    pub stats: Option<GenerationStats>,
    pub error_code: Option<String>,
    pub error: Option<String>,
    /// Wall clock; excluded from reports so they stay reproducible.
    #[serde(skip)]
    pub duration_ms: u64,
}

impl ScenarioResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Pass
    }
}

/// Runs models through generation and independent validation.
pub struct ScenarioRunner {
    /// Name of the run campaign.
    pub campaign: String,
    pub config: GeneratorConfig,
}

impl ScenarioRunner {
    #[must_use]
    pub fn new(campaign: impl Into<String>, config: GeneratorConfig) -> Self {
        Self {
            campaign: campaign.into(),
            config,
        }
    }

    /// Run all models in a set, in set order.
    pub fn run(&self, set: &ModelSet) -> Vec<ScenarioResult> {
        set.models.iter().map(|model| self.run_model(model)).collect()
    }

    pub fn run_model(&self, model: &ModelFile) -> ScenarioResult {
        let started = Instant::now();
        let mut result = ScenarioResult {
            name: model.name.clone(),
            value_counts: model.value_counts.clone(),
            order: model.order,
            seed: model.seed,
            status: ScenarioStatus::Pass,
            rows: None,
            lower_bound: None,
            fingerprint: None,
            stats: None,
            error_code: None,
            error: None,
            duration_ms: 0,
        };

        match self.execute(model, &mut result) {
            Ok(()) => {
                if let Some(expected) = &model.expect_error {
                    result.status = ScenarioStatus::Fail;
                    result.error = Some(format!("expected {expected}, generation succeeded"));
                }
            }
            Err(err) => {
                let code = err.code();
                result.status = match (&model.expect_error, result.rows) {
                    (Some(expected), _) if expected == code => ScenarioStatus::Pass,
                    (Some(_), _) | (None, Some(_)) => ScenarioStatus::Fail,
                    (None, None) => ScenarioStatus::Error,
                };
                result.error_code = Some(code.to_string());
                result.error = Some(err.to_string());
            }
        }
        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result
    }

    /// Generate, then re-check the output with the standalone validator.
    /// `result.rows` is set once generation succeeds, so a later error is a
    /// validation failure.
    fn execute(&self, model: &ModelFile, result: &mut ScenarioResult) -> Result<()> {
        let generator = model.generator(self.config)?;
        let bound = row_count_lower_bound_with_submodels(
            generator.space(),
            generator.order(),
            generator.submodels(),
        )?;
        result.lower_bound = Some(u64::try_from(bound).unwrap_or(u64::MAX));

        let (array, stats) = generator.run_with_stats(model.seed)?;
        result.rows = Some(array.len());
        result.fingerprint = Some(array.fingerprint());
        result.stats = Some(stats);

        validate_array(&array, Some(generator.exclusions()))?;
        Ok(())
    }
}
