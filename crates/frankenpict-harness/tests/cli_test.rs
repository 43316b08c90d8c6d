//! Integration test: `frankenpict` command line.
//!
//! Validates:
//! 1. `generate` output validates and is identical for identical arguments.
//! 2. `validate` accepts generated rows and rejects incomplete ones.
//! 3. `obligations` reports counts and lists obligations.
//! 4. Constraints, seed rows and submodels given as flags are honoured.
//! 5. `matrix` writes report, log and artifact index.
//! 6. Bad input exits non-zero.
//!
//! Run: cargo test -p frankenpict-harness --test cli_test

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use frankenpict_core::{
    ExclusionSet, ParameterSpace, Submodel, validate_with_exclusions, validate_with_submodels,
};
use frankenpict_harness::structured_log::validate_log_file;

fn workspace_root() -> PathBuf {
    let manifest = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest)
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn unique_tmp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after UNIX_EPOCH")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn frankenpict(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_frankenpict"))
        .args(args)
        .env_remove("FRANKENPICT_CANDIDATES")
        .env_remove("FRANKENPICT_REFINE_PASSES")
        .env_remove("FRANKENPICT_REFINE")
        .env_remove("FRANKENPICT_MAX_OBLIGATIONS")
        .output()
        .expect("frankenpict should execute")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn rows_of(doc: &serde_json::Value) -> Vec<Vec<usize>> {
    serde_json::from_value(doc["rows"].clone()).expect("rows array")
}

#[test]
fn generate_json_is_valid_and_deterministic() {
    let args = [
        "generate", "--counts", "1,3,3,4", "--order", "2", "--seed", "0x2a", "--format", "json",
    ];
    let first = stdout_json(&frankenpict(&args));
    let second = stdout_json(&frankenpict(&args));
    assert_eq!(first, second);
    assert_eq!(first["seed"], 42);
    assert_eq!(first["order"], 2);

    let rows = rows_of(&first);
    assert!((12..=15).contains(&rows.len()));
    let space = ParameterSpace::new(&[1, 3, 3, 4]).unwrap();
    let report = validate_with_exclusions(&rows, &space, 2, &ExclusionSet::empty(&space)).unwrap();
    assert_eq!(report.obligations_total, 43);
}

#[test]
fn generate_writes_csv_and_validate_reads_it() {
    let dir = unique_tmp_dir("frankenpict-cli-csv");
    let csv = dir.join("rows.csv");
    let log = dir.join("generate.jsonl");
    let out = frankenpict(&[
        "generate",
        "--counts",
        "3,3,3",
        "--format",
        "csv",
        "--output",
        csv.to_str().unwrap(),
        "--log",
        log.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    assert!(out.stdout.is_empty(), "rows go to --output, not stdout");
    let text = std::fs::read_to_string(&csv).unwrap();
    assert!(text.starts_with("p0,p1,p2\n"));

    let (lines, errors) = validate_log_file(&log).unwrap();
    assert_eq!(lines, 2);
    assert!(errors.is_empty(), "{errors:?}");

    let report = stdout_json(&frankenpict(&[
        "validate",
        "--counts",
        "3,3,3",
        "--input",
        csv.to_str().unwrap(),
    ]));
    assert_eq!(report["obligations_total"], 27);
    assert_eq!(report["obligations_covered"], 27);
}

#[test]
fn validate_rejects_incomplete_rows() {
    let dir = unique_tmp_dir("frankenpict-cli-gap");
    let input = dir.join("rows.tsv");
    std::fs::write(&input, "p0\tp1\n0\t0\n0\t1\n1\t0\n").unwrap();
    let out = frankenpict(&["validate", "--counts", "2,2", "--input", input.to_str().unwrap()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("1 obligation(s) uncovered"), "{stderr}");
    assert!(stderr.contains("{p0=1, p1=1}"), "{stderr}");
}

#[test]
fn obligations_counts_and_lists() {
    let summary = stdout_json(&frankenpict(&["obligations", "--counts", "1,3,3,4"]));
    assert_eq!(summary["obligations"], "43");
    assert_eq!(summary["row_count_lower_bound"], "12");

    let out = frankenpict(&["obligations", "--counts", "2,2", "--list"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    let listed: Vec<&str> = text.lines().take(4).collect();
    assert_eq!(
        listed,
        ["{p0=0, p1=0}", "{p0=0, p1=1}", "{p0=1, p1=0}", "{p0=1, p1=1}"]
    );
}

#[test]
fn exclusions_and_seed_rows_from_flags() {
    let doc = stdout_json(&frankenpict(&[
        "generate",
        "--counts",
        "2,3,3,2",
        "--seed",
        "11",
        "--exclude",
        "0=1,1=2",
        "--exclude",
        "2=0,3=1",
        "--seed-row",
        "0,*,1,*",
        "--format",
        "json",
    ]));
    let rows = rows_of(&doc);
    assert_eq!(rows[0][0], 0);
    assert_eq!(rows[0][2], 1);

    let space = ParameterSpace::new(&[2, 3, 3, 2]).unwrap();
    let exclusions = ExclusionSet::new(&space, &[vec![(0, 1), (1, 2)], vec![(2, 0), (3, 1)]]).unwrap();
    let report = validate_with_exclusions(&rows, &space, 2, &exclusions).unwrap();
    assert_eq!(report.obligations_excluded, 2);
}

#[test]
fn submodel_flag_raises_coverage_on_both_sides() {
    let dir = unique_tmp_dir("frankenpict-cli-submodel");
    let doc = stdout_json(&frankenpict(&[
        "generate", "--counts", "3,3,3,3", "--submodel", "0,1,2@3", "--seed", "6", "--format",
        "json",
    ]));
    assert_eq!(doc["submodels"][0]["positions"], serde_json::json!([0, 1, 2]));
    let rows = rows_of(&doc);
    assert!(rows.len() >= 27, "rows={}", rows.len());
    let space = ParameterSpace::new(&[3, 3, 3, 3]).unwrap();
    let triple = Submodel::new(&space, &[0, 1, 2], 3).unwrap();
    let report =
        validate_with_submodels(&rows, &space, 2, &ExclusionSet::empty(&space), &[triple]).unwrap();
    assert_eq!(report.obligations_total, 81);

    let pairwise = dir.join("pairwise.tsv");
    let out = frankenpict(&[
        "generate",
        "--counts",
        "3,3,3,3",
        "--output",
        pairwise.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    let plain = frankenpict(&["validate", "--counts", "3,3,3,3", "--input", pairwise.to_str().unwrap()]);
    assert!(plain.status.success());
    let raised = frankenpict(&[
        "validate",
        "--counts",
        "3,3,3,3",
        "--submodel",
        "0,1,2@3",
        "--input",
        pairwise.to_str().unwrap(),
    ]);
    assert!(!raised.status.success());
    assert!(String::from_utf8_lossy(&raised.stderr).contains("uncovered"));
}

#[test]
fn model_file_drives_generation() {
    let model = workspace_root().join("tests/scenarios/constrained_corner.json");
    let from_model = stdout_json(&frankenpict(&[
        "generate",
        "--model",
        model.to_str().unwrap(),
        "--format",
        "json",
    ]));
    let from_flags = stdout_json(&frankenpict(&[
        "generate",
        "--counts",
        "2,3,3,2",
        "--seed",
        "11",
        "--exclude",
        "0=1,1=2",
        "--exclude",
        "2=0,3=1",
        "--seed-row",
        "0,*,1,*",
        "--format",
        "json",
    ]));
    assert_eq!(from_model, from_flags);
}

#[test]
fn matrix_writes_report_log_and_index() {
    let dir = unique_tmp_dir("frankenpict-cli-matrix");
    let report_path = dir.join("matrix.json");
    let log_path = dir.join("matrix.jsonl");
    let index_path = dir.join("index.json");
    let scenarios = workspace_root().join("tests/scenarios");
    let out = frankenpict(&[
        "matrix",
        "--scenarios",
        scenarios.to_str().unwrap(),
        "--output",
        report_path.to_str().unwrap(),
        "--log",
        log_path.to_str().unwrap(),
        "--artifact-index",
        index_path.to_str().unwrap(),
    ]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    let total = report["summary"]["total_scenarios"].as_u64().unwrap();
    assert_eq!(report["summary"]["passed"].as_u64(), Some(total));

    let (lines, errors) = validate_log_file(&log_path).unwrap();
    assert_eq!(lines as u64, total + 1, "one line per scenario plus summary");
    assert!(errors.is_empty(), "{errors:?}");

    let index: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&index_path).unwrap()).unwrap();
    let kinds: Vec<&str> = index["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["coverage_matrix", "log"]);
}

#[test]
fn bad_input_exits_non_zero() {
    for args in [
        &["generate", "--counts", "3,0"][..],
        &["generate", "--counts", "3,-2"],
        &["generate", "--counts", "2,2", "--order", "3"],
        &["generate", "--counts", "2,2", "--format", "xml"],
        &["generate", "--counts", "2,2", "--seed-row", "5,*"],
        &["generate", "--counts", "2,2", "--submodel", "0,7@2"],
        &["generate", "--counts", "2,2", "--submodel", "0,1"],
        &["obligations", "--counts", "2,2", "--order", "0"],
        &["generate"],
    ] {
        let out = frankenpict(args);
        assert!(!out.status.success(), "{args:?} should fail");
    }
}
