//! Coverage matrix generation.
//!
//! Runs every model of a set and emits a machine-readable report with one row
//! per scenario and an aggregate per interaction order. The report carries no
//! timestamps or durations, so identical inputs give byte-identical JSON.

use std::collections::BTreeMap;

use frankenpict_core::GeneratorConfig;
use serde::{Deserialize, Serialize};

use crate::model::ModelFile;
use crate::runner::{ScenarioResult, ScenarioRunner, ScenarioStatus};

/// One scenario row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub trace_id: String,
    pub name: String,
    pub value_counts: Vec<i64>,
    pub order: usize,
    pub seed: u64,
    pub rows: Option<usize>,
    pub lower_bound: Option<u64>,
    /// `rows / lower_bound`; 1.0 is optimal.
    pub ratio: Option<f64>,
    pub fingerprint: Option<String>,
    pub obligations_total: Option<u64>,
    pub obligations_excluded: Option<u64>,
    pub fallback_rows: Option<usize>,
    pub status: String,
    pub passed: bool,
    pub error_code: Option<String>,
    pub error: Option<String>,
}

/// Aggregate over all scenarios with the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMatrixRow {
    pub order: usize,
    pub scenarios: u64,
    pub passed: u64,
    pub total_rows: u64,
    pub total_lower_bound: u64,
    pub mean_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageMatrixSummary {
    pub total_scenarios: u64,
    pub passed: u64,
    pub failed: u64,
    pub errors: u64,
    pub pass_rate_percent: f64,
}

/// Top-level matrix report payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageMatrixReport {
    pub schema_version: String,
    pub campaign: String,
    pub config: GeneratorConfig,
    pub summary: CoverageMatrixSummary,
    pub order_matrix: Vec<OrderMatrixRow>,
    pub scenarios: Vec<ScenarioRow>,
}

impl CoverageMatrixReport {
    /// Returns true when no failures/errors are present.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.errors == 0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build a deterministic coverage matrix from models.
#[must_use]
pub fn build_coverage_matrix(
    models: &[ModelFile],
    config: GeneratorConfig,
    campaign: &str,
) -> CoverageMatrixReport {
    let runner = ScenarioRunner::new(campaign, config);
    let results: Vec<ScenarioResult> = models.iter().map(|m| runner.run_model(m)).collect();
    matrix_from_results(&results, config, campaign)
}

/// Assemble a report from results that were already computed.
#[must_use]
pub fn matrix_from_results(
    results: &[ScenarioResult],
    config: GeneratorConfig,
    campaign: &str,
) -> CoverageMatrixReport {
    let mut rows: Vec<ScenarioRow> = results.iter().map(|r| scenario_row(r, campaign)).collect();
    rows.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.order.cmp(&b.order))
            .then_with(|| a.seed.cmp(&b.seed))
            .then_with(|| a.value_counts.cmp(&b.value_counts))
    });

    let count = |status: &str| {
        u64::try_from(rows.iter().filter(|row| row.status == status).count()).unwrap_or(0)
    };
    let total_scenarios = u64::try_from(rows.len()).unwrap_or(u64::MAX);
    let passed = count(ScenarioStatus::Pass.as_str());
    let failed = count(ScenarioStatus::Fail.as_str());
    let errors = count(ScenarioStatus::Error.as_str());

    // order -> (scenarios, passed, rows, bound, ratio sum, ratio count)
    let mut buckets: BTreeMap<usize, (u64, u64, u64, u64, f64, u64)> = BTreeMap::new();
    for row in &rows {
        let bucket = buckets.entry(row.order).or_insert((0, 0, 0, 0, 0.0, 0));
        bucket.0 = bucket.0.saturating_add(1);
        if row.passed {
            bucket.1 = bucket.1.saturating_add(1);
        }
        if let (Some(n), Some(bound), Some(ratio)) = (row.rows, row.lower_bound, row.ratio) {
            bucket.2 = bucket.2.saturating_add(u64::try_from(n).unwrap_or(u64::MAX));
            bucket.3 = bucket.3.saturating_add(bound);
            bucket.4 += ratio;
            bucket.5 += 1;
        }
    }
    let order_matrix = buckets
        .into_iter()
        .map(
            |(order, (scenarios, passed, total_rows, total_lower_bound, ratio_sum, ratio_n))| {
                OrderMatrixRow {
                    order,
                    scenarios,
                    passed,
                    total_rows,
                    total_lower_bound,
                    mean_ratio: if ratio_n == 0 {
                        0.0
                    } else {
                        ratio_sum / ratio_n as f64
                    },
                }
            },
        )
        .collect();

    CoverageMatrixReport {
        schema_version: "v1".to_string(),
        campaign: campaign.to_string(),
        config,
        summary: CoverageMatrixSummary {
            total_scenarios,
            passed,
            failed,
            errors,
            pass_rate_percent: ratio_percent(passed, total_scenarios),
        },
        order_matrix,
        scenarios: rows,
    }
}

fn scenario_row(result: &ScenarioResult, campaign: &str) -> ScenarioRow {
    let ratio = match (result.rows, result.lower_bound) {
        (Some(rows), Some(bound)) if bound > 0 => Some(rows as f64 / bound as f64),
        _ => None,
    };
    ScenarioRow {
        trace_id: format!(
            "{campaign}::{name}::t{order}::s{seed}",
            name = result.name,
            order = result.order,
            seed = result.seed
        ),
        name: result.name.clone(),
        value_counts: result.value_counts.clone(),
        order: result.order,
        seed: result.seed,
        rows: result.rows,
        lower_bound: result.lower_bound,
        ratio,
        fingerprint: result.fingerprint.clone(),
        obligations_total: result.stats.as_ref().map(|s| s.obligations_total),
        obligations_excluded: result
            .stats
            .as_ref()
            .map(|s| s.obligations_excluded + s.obligations_infeasible),
        fallback_rows: result.stats.as_ref().map(|s| s.fallback_rows),
        status: result.status.as_str().to_string(),
        passed: result.passed(),
        error_code: result.error_code.clone(),
        error: result.error.clone(),
    }
}

fn ratio_percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator as f64 * 100.0) / denominator as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> Vec<ModelFile> {
        let mut bad = ModelFile::new("zero_count", &[2, 0], 1);
        bad.seed = 5;
        vec![
            ModelFile::new("ternary", &[3, 3, 3], 2),
            ModelFile::new("binary_pair", &[2, 2], 2),
            bad,
        ]
    }

    #[test]
    fn rows_are_sorted_and_counted() {
        let report = build_coverage_matrix(&models(), GeneratorConfig::default(), "unit");
        assert_eq!(report.schema_version, "v1");
        let names: Vec<&str> = report.scenarios.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["binary_pair", "ternary", "zero_count"]);
        assert_eq!(report.summary.total_scenarios, 3);
        assert_eq!(report.summary.passed, 2);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.failed, 0);
        assert!(!report.all_passed());
        assert_eq!(report.scenarios[0].trace_id, "unit::binary_pair::t2::s0");
        assert_eq!(report.scenarios[0].ratio, Some(1.0));
        assert_eq!(report.scenarios[1].obligations_total, Some(27));
        assert_eq!(report.scenarios[2].error_code.as_deref(), Some("invalid_input"));
    }

    #[test]
    fn order_aggregates() {
        let report = build_coverage_matrix(&models(), GeneratorConfig::default(), "unit");
        let orders: Vec<usize> = report.order_matrix.iter().map(|r| r.order).collect();
        assert_eq!(orders, [1, 2]);
        let pairwise = &report.order_matrix[1];
        assert_eq!(pairwise.scenarios, 2);
        assert_eq!(pairwise.passed, 2);
        assert_eq!(pairwise.total_lower_bound, 4 + 9);
        assert!(pairwise.mean_ratio >= 1.0);
        assert_eq!(report.order_matrix[0].total_rows, 0);
    }

    #[test]
    fn report_json_is_reproducible() {
        let a = build_coverage_matrix(&models(), GeneratorConfig::default(), "unit");
        let b = build_coverage_matrix(&models(), GeneratorConfig::default(), "unit");
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn ratio_percent_handles_empty() {
        assert_eq!(ratio_percent(0, 0), 0.0);
        assert_eq!(ratio_percent(1, 4), 25.0);
    }
}
