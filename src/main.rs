//! Gradelens: score sheet anomaly detector CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use gradelens::analyzer::AnalysisEngine;
use gradelens::config::{build_ignore_set, engine_from_config, is_ignored, load_config, CONFIG_FILENAME};
use gradelens::dataset::parse_csv_str;
use gradelens::filter::ReportFilter;
use gradelens::reporter::{ConsoleReporter, CsvReporter, JsonReporter};
use gradelens::{AnalysisMode, AnalysisResult, AnomalyKind, AnomalyReport, Severity, Threshold};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

/// Data file extensions picked up when scanning a directory
const DATA_EXTENSIONS: &[&str] = &["csv", "json"];

/// Gradelens: statistical anomaly detection for student score sheets
#[derive(Parser, Debug)]
#[command(name = "gradelens")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Score sheet (.csv or .json), directory to scan, or - for CSV on stdin
    #[arg(required = true)]
    path: Option<PathBuf>,

    /// Analysis mode: component (TX1..CK) or summary (subject averages)
    #[arg(long, short)]
    mode: Option<AnalysisMode>,

    /// Z-score threshold (default 2.5)
    #[arg(long, short)]
    threshold: Option<f64>,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    /// Export the (filtered) anomaly list to a CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Only report these classes (repeatable)
    #[arg(long = "class", value_name = "CLASS")]
    classes: Vec<String>,

    /// Only report these anomaly kinds (repeatable)
    #[arg(long = "kind", value_name = "KIND")]
    kinds: Vec<AnomalyKind>,

    /// Only report these severities (repeatable)
    #[arg(long = "severity", value_name = "SEVERITY")]
    severities: Vec<Severity>,

    /// Exit 1 when an anomaly at or above this severity is reported
    #[arg(long, value_name = "SEVERITY")]
    fail_on: Option<Severity>,

    /// Quiet mode (one line per file)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output (column distributions, full anomaly list)
    #[arg(long, short)]
    verbose: bool,

    /// Path to config file (default: search .gradelensrc.json in the input directory and parents)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Analyze files in parallel (default for directories with many files)
    #[arg(long)]
    parallel: bool,

    /// Number of parallel threads (default: number of CPU cores)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create .gradelensrc.json with sensible defaults
    Init {
        /// Z-score threshold (e.g. 2.5)
        #[arg(long)]
        threshold: Option<f64>,

        /// Default analysis mode: component or summary
        #[arg(long)]
        mode: Option<AnalysisMode>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    if let Some(Commands::Init { threshold, mode, dir }) = &args.command {
        return run_init(*threshold, *mode, dir.as_deref());
    }

    let Some(path) = args.path.clone() else {
        anyhow::bail!("a data file, directory or - is required");
    };
    let from_stdin = path.as_os_str() == "-";

    // Resolve work directory for config search
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let work_dir = if from_stdin {
        cwd.as_path()
    } else if path.is_file() {
        path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(cwd.as_path())
    } else {
        path.as_path()
    };

    // Load config (CLI flags override config file)
    let config = load_config(work_dir, args.config.as_deref())?
        .merge_with_cli(args.threshold, args.mode, args.fail_on);
    let engine = engine_from_config(&config)?;
    let mode = config.effective_mode();

    let filter = build_filter(&args);

    let (results, had_errors) = if from_stdin {
        (vec![analyze_stdin(&engine, mode)?], false)
    } else {
        let ignore_set = if config.ignore.is_empty() {
            None
        } else {
            Some(build_ignore_set(&config.ignore)?)
        };
        let files = collect_data_files(&path, ignore_set.as_ref(), &config.extended_files)?;
        if files.is_empty() {
            eprintln!("{}: No .csv or .json files found", "Warning".yellow());
            return Ok(ExitCode::from(2));
        }

        if let Some(jobs) = args.jobs {
            rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
                .ok();
        }

        let use_parallel = args.parallel || files.len() > 10;
        let outcomes = if use_parallel {
            engine.analyze_parallel(&files, mode)
        } else {
            engine.analyze_many(&files, mode)
        };
        collect_results(outcomes, args.quiet)
    };

    if results.is_empty() {
        eprintln!("{}: All files failed to analyze", "Error".red());
        return Ok(ExitCode::from(2));
    }

    // Each result paired with the view the filters leave of it
    let views: Vec<(AnalysisResult, AnomalyReport)> = results
        .into_iter()
        .map(|result| {
            let filtered = filter.apply(&result.report);
            (result, filtered)
        })
        .collect();

    let filtered_results: Vec<AnalysisResult> = views
        .iter()
        .map(|(result, filtered)| AnalysisResult {
            report: filtered.clone(),
            ..result.clone()
        })
        .collect();
    let stats = AnalysisEngine::aggregate_stats(&filtered_results);

    if let Some(ref csv_path) = args.csv {
        let mut combined = AnomalyReport::new();
        for (_, filtered) in &views {
            combined.extend(filtered.records().to_vec());
        }
        CsvReporter::new().write_to_path(&combined, csv_path)?;
        if !args.quiet && !args.json {
            eprintln!(
                "{}: {} anomalies written to {}",
                "Info".blue(),
                combined.len(),
                csv_path.display()
            );
        }
    }

    // Output results
    if args.json {
        let reporter = JsonReporter::new().pretty();
        if filtered_results.len() == 1 {
            println!("{}", reporter.report(&filtered_results[0]));
        } else {
            println!("{}", reporter.report_with_summary(&filtered_results, &stats));
        }
    } else if args.quiet {
        let reporter = ConsoleReporter::new();
        for (result, filtered) in &views {
            reporter.report_quiet(result, filtered);
        }
    } else {
        let mut reporter = ConsoleReporter::new();
        if args.verbose {
            reporter = reporter.verbose();
        }

        if views.len() == 1 {
            reporter.report(&views[0].0, &views[0].1);
        } else {
            reporter.report_many(&views, &stats);
        }
    }

    // Check fail-on (config or CLI)
    if let Some(level) = config.fail_on {
        let failing = views.iter().any(|(_, filtered)| filtered.has_severity_at_least(level));
        if failing {
            if !args.quiet && !args.json {
                eprintln!(
                    "\n{}: anomalies at or above {} severity were found",
                    "Failed".red().bold(),
                    level
                );
            }
            return Ok(ExitCode::from(1));
        }
    }

    if had_errors {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn build_filter(args: &Args) -> ReportFilter {
    let mut filter = ReportFilter::new();
    if !args.classes.is_empty() {
        filter = filter.with_classes(args.classes.iter().map(String::as_str));
    }
    if !args.kinds.is_empty() {
        filter = filter.with_kinds(args.kinds.iter().copied());
    }
    if !args.severities.is_empty() {
        filter = filter.with_severities(args.severities.iter().copied());
    }
    filter
}

fn analyze_stdin(engine: &AnalysisEngine, mode: AnalysisMode) -> Result<AnalysisResult> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read CSV from stdin")?;
    let dataset = parse_csv_str(&text).context("Failed to parse CSV from stdin")?;
    engine.analyze_dataset(&dataset, mode, None)
}

/// Split analysis outcomes into results and an error flag, reporting failures
fn collect_results(outcomes: Vec<Result<AnalysisResult>>, quiet: bool) -> (Vec<AnalysisResult>, bool) {
    let mut had_errors = false;
    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                had_errors = true;
                if !quiet {
                    eprintln!("{}: {:#}", "Error".red(), e);
                }
            }
        }
    }
    (results, had_errors)
}

fn run_init(threshold: Option<f64>, mode: Option<AnalysisMode>, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let threshold = match threshold {
        Some(t) => Threshold::new(t)?,
        None => Threshold::default(),
    };
    let mode = mode.unwrap_or_default();

    let starter = serde_json::json!({
        "threshold": threshold,
        "mode": mode,
        "ignoreKinds": [],
        "ignore": ["**/archive/**"]
    });
    let mut json = serde_json::to_string_pretty(&starter).context("Failed to encode config")?;
    json.push('\n');

    std::fs::write(&config_path, json)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!(
        "{}: Created {} with threshold={}, mode={}",
        "Done".green().bold(),
        config_path.display(),
        threshold,
        mode
    );
    Ok(ExitCode::SUCCESS)
}

/// Walks `path` for data files. Base configs named in `config_files` are skipped
/// so a shared `base.json` next to the sheets is not read as a sheet.
fn collect_data_files(
    path: &Path,
    ignore_set: Option<&globset::GlobSet>,
    config_files: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if let Some(set) = ignore_set {
            if is_ignored(path, set) {
                return Ok(vec![]);
            }
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let file_path = entry.path();
        if entry.file_type().is_file() && is_data_file(file_path) {
            if let Some(set) = ignore_set {
                if is_ignored(file_path, set) {
                    continue;
                }
            }
            if is_config_file(file_path, config_files) {
                log::debug!("skipping extended config {}", file_path.display());
                continue;
            }
            files.push(file_path.to_path_buf());
        }
    }

    // Sort for consistent output
    files.sort();

    Ok(files)
}

fn is_config_file(path: &Path, config_files: &[PathBuf]) -> bool {
    if config_files.is_empty() {
        return false;
    }
    path.canonicalize()
        .map(|p| config_files.contains(&p))
        .unwrap_or(false)
}

fn is_data_file(path: &Path) -> bool {
    if path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
    {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DATA_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
