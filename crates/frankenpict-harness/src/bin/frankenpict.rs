//! CLI entrypoint for frankenpict.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use frankenpict_core::{
    ExclusionSet, GeneratorConfig, Obligations, ParameterSpace, Submodel, obligation_count,
    row_count_lower_bound, validate_with_submodels,
};
use frankenpict_harness::args::{
    parse_counts, parse_exclusion, parse_seed, parse_seed_row, parse_submodel,
};
use frankenpict_harness::coverage_matrix::matrix_from_results;
use frankenpict_harness::render::{self, OutputFormat};
use frankenpict_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, StreamKind,
};
use frankenpict_harness::{ModelFile, ModelSet, ScenarioRunner, ScenarioStatus};

/// Pairwise and t-wise test case generation.
#[derive(Debug, Parser)]
#[command(name = "frankenpict")]
#[command(about = "Seeded t-wise covering-array generator and validator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a covering array.
    Generate {
        /// Comma-separated value counts, e.g. `1,3,3,4`.
        #[arg(long, required_unless_present = "model")]
        counts: Option<String>,
        /// Interaction order t (default 2, or the model's).
        #[arg(long)]
        order: Option<usize>,
        /// Root seed (decimal or 0x...). Overrides the model's seed.
        #[arg(long)]
        seed: Option<String>,
        /// JSON model file. `--counts` replaces its counts when both are given.
        #[arg(long)]
        model: Option<PathBuf>,
        /// Excluded combination, e.g. `0=1,2=0`. Repeatable.
        #[arg(long)]
        exclude: Vec<String>,
        /// Partial row to emit first, e.g. `1,*,2,*`. Repeatable.
        #[arg(long)]
        seed_row: Vec<String>,
        /// Parameter group at a higher order, e.g. `0,2,4@3`. Repeatable.
        #[arg(long)]
        submodel: Vec<String>,
        /// Output format: `json`, `csv`, `tsv` or `table`.
        #[arg(long, default_value = "tsv")]
        format: String,
        /// Output file path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Candidates scored per row (overrides FRANKENPICT_CANDIDATES).
        #[arg(long)]
        candidates: Option<usize>,
        /// Hill-climb passes per row (overrides FRANKENPICT_REFINE_PASSES).
        #[arg(long)]
        refine_passes: Option<usize>,
        /// Print generation statistics as JSON on stderr.
        #[arg(long)]
        stats: bool,
    },
    /// Check that rows cover every t-way combination.
    Validate {
        #[arg(long)]
        counts: String,
        #[arg(long, default_value_t = 2)]
        order: usize,
        /// Rows to check.
        #[arg(long)]
        input: PathBuf,
        /// `json`, `csv` or `tsv`; inferred from the extension when omitted.
        #[arg(long)]
        format: Option<String>,
        /// Excluded combination, e.g. `0=1,2=0`. Repeatable.
        #[arg(long)]
        exclude: Vec<String>,
        /// Parameter group at a higher order, e.g. `0,2,4@3`. Repeatable.
        #[arg(long)]
        submodel: Vec<String>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Count (or list) the obligations of a parameter space.
    Obligations {
        #[arg(long)]
        counts: String,
        #[arg(long, default_value_t = 2)]
        order: usize,
        /// Print every obligation, one per line.
        #[arg(long)]
        list: bool,
    },
    /// Run every model in a directory and emit a coverage matrix.
    Matrix {
        /// Directory containing model JSON files.
        #[arg(long, default_value = "tests/scenarios")]
        scenarios: PathBuf,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Artifact index JSON path (hashes of the report and log).
        #[arg(long)]
        artifact_index: Option<PathBuf>,
        #[arg(long, default_value = "matrix")]
        campaign: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            counts,
            order,
            seed,
            model,
            exclude,
            seed_row,
            submodel,
            format,
            output,
            log,
            candidates,
            refine_passes,
            stats,
        } => {
            let format = OutputFormat::from_str_loose(&format)
                .ok_or_else(|| format!("unknown output format '{format}'"))?;
            let mut model = match &model {
                Some(path) => ModelFile::from_file(path)?,
                None => ModelFile::new("cli", &[], 2),
            };
            if let Some(raw) = counts {
                model.value_counts = parse_counts(&raw)?;
            }
            if let Some(order) = order {
                model.order = order;
            }
            if let Some(raw) = seed {
                model.seed = parse_seed(&raw)?;
            }
            for raw in &exclude {
                model.exclusions.push(parse_exclusion(raw)?);
            }
            for raw in &seed_row {
                model
                    .seed_rows
                    .push(parse_seed_row(raw)?.values().to_vec());
            }
            if !submodel.is_empty() {
                let space = model.space()?;
                for raw in &submodel {
                    let (positions, order) = parse_submodel(raw)?;
                    model
                        .submodels
                        .push(Submodel::new(&space, &positions, order)?);
                }
            }

            let mut config = GeneratorConfig::from_env();
            if let Some(k) = candidates {
                config = config.with_candidate_pool(k);
            }
            if let Some(p) = refine_passes {
                config = config.with_refine_passes(p);
            }

            let mut emitter = open_log(log.as_deref(), "generate", &format!("seed-{}", model.seed))?;
            log_entry(
                &mut emitter,
                LogEntry::new("", LogLevel::Info, "generate_start")
                    .with_stream(StreamKind::Generate)
                    .with_gate(&model.name)
                    .with_run(model.order, model.seed)
                    .with_details(serde_json::json!({
                        "value_counts": model.value_counts,
                        "exclusions": model.exclusions.len(),
                        "seed_rows": model.seed_rows.len(),
                        "submodels": model.submodels,
                        "config": config,
                    })),
            )?;

            let started = Instant::now();
            let outcome = model
                .generator(config)
                .and_then(|generator| generator.run_with_stats(model.seed).map_err(Into::into));
            let (array, run_stats) = match outcome {
                Ok(done) => done,
                Err(err) => {
                    log_entry(
                        &mut emitter,
                        LogEntry::new("", LogLevel::Error, "generate_failed")
                            .with_stream(StreamKind::Generate)
                            .with_outcome(Outcome::Error)
                            .with_details(serde_json::json!({
                                "error_code": err.code(),
                                "error": err.to_string(),
                            })),
                    )?;
                    finish_log(&mut emitter)?;
                    eprintln!("Generation failed: {err}");
                    return Err(err.into());
                }
            };

            let rendered = render::render(&array, format)?;
            write_output(output.as_deref(), &rendered)?;
            if stats {
                eprintln!("{}", serde_json::to_string_pretty(&run_stats)?);
            }

            let mut entry = LogEntry::new("", LogLevel::Info, "generate_done")
                .with_stream(StreamKind::Generate)
                .with_run(array.order(), array.seed())
                .with_outcome(Outcome::Pass)
                .with_counts(array.len(), run_stats.obligations_total)
                .with_duration_ms(elapsed_ms(started))
                .with_details(serde_json::json!({
                    "fingerprint": array.fingerprint(),
                    "stats": run_stats,
                }));
            if let Some(path) = &output {
                entry = entry.with_artifacts(vec![path.display().to_string()]);
            }
            log_entry(&mut emitter, entry)?;
            finish_log(&mut emitter)?;
        }
        Command::Validate {
            counts,
            order,
            input,
            format,
            exclude,
            submodel,
            log,
        } => {
            let format = match format {
                Some(raw) => OutputFormat::from_str_loose(&raw)
                    .ok_or_else(|| format!("unknown input format '{raw}'"))?,
                None => OutputFormat::from_path(&input).ok_or_else(|| {
                    format!("cannot infer format of {}; pass --format", input.display())
                })?,
            };
            let space = ParameterSpace::from_signed(&parse_counts(&counts)?)?;
            let raw_exclusions = exclude
                .iter()
                .map(|raw| parse_exclusion(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let exclusions = ExclusionSet::new(&space, &raw_exclusions)?;
            let submodels = submodel
                .iter()
                .map(|raw| {
                    let (positions, order) = parse_submodel(raw)?;
                    Ok(Submodel::new(&space, &positions, order)?)
                })
                .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;
            let text = std::fs::read_to_string(&input)
                .map_err(|e| format!("{}: {e}", input.display()))?;
            let rows = render::parse_rows(&text, format)?;

            let mut emitter = open_log(log.as_deref(), "validate", "input")?;
            let started = Instant::now();
            let verdict = validate_with_submodels(&rows, &space, order, &exclusions, &submodels);
            let entry = LogEntry::new("", LogLevel::Info, "validate_done")
                .with_stream(StreamKind::Validate)
                .with_gate(input.display().to_string())
                .with_duration_ms(elapsed_ms(started));
            match verdict {
                Ok(report) => {
                    log_entry(
                        &mut emitter,
                        entry
                            .with_outcome(Outcome::Pass)
                            .with_counts(report.rows, report.obligations_total),
                    )?;
                    finish_log(&mut emitter)?;
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Err(err) => {
                    let mut entry = entry.with_outcome(Outcome::Fail).with_details(
                        serde_json::json!({"error_code": err.code(), "error": err.to_string()}),
                    );
                    entry.level = LogLevel::Error;
                    log_entry(&mut emitter, entry)?;
                    finish_log(&mut emitter)?;
                    eprintln!("Validation failed: {err}");
                    return Err(err.into());
                }
            }
        }
        Command::Obligations {
            counts,
            order,
            list,
        } => {
            let space = ParameterSpace::from_signed(&parse_counts(&counts)?)?;
            let total = obligation_count(&space, order)?;
            let bound = row_count_lower_bound(&space, order)?;
            if list {
                for obligation in Obligations::new(&space, order)? {
                    println!("{obligation}");
                }
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "value_counts": space.value_counts(),
                    "order": order,
                    "obligations": total.to_string(),
                    "row_count_lower_bound": bound.to_string(),
                }))?
            );
        }
        Command::Matrix {
            scenarios,
            output,
            log,
            artifact_index,
            campaign,
        } => {
            let set = ModelSet::from_dir(&scenarios)?;
            if set.is_empty() {
                return Err(format!("No model JSON files found in {}", scenarios.display()).into());
            }
            eprintln!(
                "Running {} scenario(s) from {}",
                set.len(),
                scenarios.display()
            );

            let config = GeneratorConfig::from_env();
            let mut emitter = open_log(log.as_deref(), &campaign, "matrix")?;
            let runner = ScenarioRunner::new(&campaign, config);
            let results = runner.run(&set);
            for result in &results {
                let (level, outcome) = if result.passed() {
                    (LogLevel::Info, Outcome::Pass)
                } else if result.status == ScenarioStatus::Fail {
                    (LogLevel::Error, Outcome::Fail)
                } else {
                    (LogLevel::Error, Outcome::Error)
                };
                let mut entry = LogEntry::new("", level, "scenario_result")
                    .with_stream(StreamKind::Matrix)
                    .with_gate(&result.name)
                    .with_run(result.order, result.seed)
                    .with_outcome(outcome)
                    .with_duration_ms(result.duration_ms);
                if let (Some(rows), Some(stats)) = (result.rows, &result.stats) {
                    entry = entry.with_counts(rows, stats.obligations_total);
                }
                if let Some(code) = &result.error_code {
                    entry = entry.with_details(serde_json::json!({
                        "error_code": code,
                        "error": result.error,
                    }));
                }
                log_entry(&mut emitter, entry)?;
            }

            let report = matrix_from_results(&results, config, &campaign);
            let json = report.to_json()?;
            write_output(output.as_deref(), &format!("{json}\n"))?;
            eprintln!(
                "Matrix complete: total={}, passed={}, failed={}, errors={}",
                report.summary.total_scenarios,
                report.summary.passed,
                report.summary.failed,
                report.summary.errors
            );

            let mut summary = LogEntry::new(
                "",
                if report.all_passed() {
                    LogLevel::Info
                } else {
                    LogLevel::Error
                },
                "matrix_summary",
            )
            .with_stream(StreamKind::Matrix)
            .with_gate("summary")
            .with_outcome(if report.all_passed() {
                Outcome::Pass
            } else {
                Outcome::Fail
            })
            .with_details(serde_json::to_value(&report.summary)?);
            if let Some(path) = &output {
                summary = summary.with_artifacts(vec![path.display().to_string()]);
            }
            log_entry(&mut emitter, summary)?;
            finish_log(&mut emitter)?;

            if let Some(index_path) = artifact_index {
                let mut index = ArtifactIndex::new("matrix", &campaign);
                if let Some(path) = &output {
                    index.add_file(path, "coverage_matrix")?;
                }
                if let Some(path) = &log {
                    index.add_file(path, "log")?;
                }
                std::fs::write(&index_path, index.to_json()?)?;
            }

            if !report.all_passed() {
                return Err("Coverage matrix has failing scenarios".into());
            }
        }
    }

    Ok(())
}

fn open_log(
    path: Option<&Path>,
    campaign: &str,
    run_id: &str,
) -> std::io::Result<Option<LogEmitter>> {
    path.map(|p| LogEmitter::to_file(p, campaign, run_id))
        .transpose()
}

fn log_entry(emitter: &mut Option<LogEmitter>, entry: LogEntry) -> std::io::Result<()> {
    match emitter {
        Some(emitter) => emitter.emit_entry(entry),
        None => Ok(()),
    }
}

fn finish_log(emitter: &mut Option<LogEmitter>) -> std::io::Result<()> {
    match emitter {
        Some(emitter) => emitter.flush(),
        None => Ok(()),
    }
}

fn write_output(path: Option<&Path>, content: &str) -> std::io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, content),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
