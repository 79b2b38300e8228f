//! # fwb CLI Entry Point
//!
//! Parses CLI arguments with clap and runs the pipeline:
//! discover → classify → select → shard → execute → report.
//!
//! Each parallel CI job invokes `fwb` with identical inputs and a distinct
//! `--parallel-index`, so every job computes the same ordered unit list and
//! builds only its own slice of it. Configuration errors (bad rules, bad
//! manifest, conflicting flags, out-of-range shard index) abort before any
//! build starts; per-unit build failures only surface in the exit code.

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use fwbuild::classify::ClassificationSet;
use fwbuild::discover;
use fwbuild::executor::{DEFAULT_IGNORE_WARNINGS, Executor, WarningFilter};
use fwbuild::manifest::Manifest;
use fwbuild::report;
use fwbuild::rules;
use fwbuild::select::{SelectPolicy, select};
use fwbuild::shard::take_shard;
use fwbuild::size::SizeSink;
use fwbuild::toolchain::CommandToolchain;

/// Rough number of units one CI job should carry; only used for the
/// suggested `--parallel-count` hint.
const UNITS_PER_JOB: usize = 30;

/// The conventional CI configuration scheme: `sdkconfig.ci` builds as
/// "default", each `sdkconfig.ci.NAME` builds as "NAME", and projects with
/// neither still get one "default" build.
const DEFAULT_CONFIG_RULES: &[&str] = &["sdkconfig.ci=default", "sdkconfig.ci.*=", "=default"];

#[derive(Parser)]
#[command(name = "fwb")]
#[command(about = "Build every example project for every target and configuration", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Root directories to scan for example projects
    #[arg(default_value = "examples")]
    paths: Vec<PathBuf>,

    /// Build for a specific target, or "all" for every known target
    #[arg(short, long, default_value = "all")]
    target: String,

    /// Additional configuration rule (FILENAME=NAME, FILEPATTERN with one
    /// wildcard, or =NAME); appended to the conventional CI rules
    #[arg(long = "config")]
    config: Vec<String>,

    /// Manifest rule file (TOML) constraining (project, target) pairs
    #[arg(long)]
    manifest: Vec<PathBuf>,

    /// Number of parallel build jobs
    #[arg(long, default_value_t = 1)]
    parallel_count: usize,

    /// Index (1-based) of this job, out of --parallel-count
    #[arg(long, default_value_t = 1)]
    parallel_index: usize,

    /// Exclude the pytest examples
    #[arg(long, alias = "no_pytest", conflicts_with = "pytest")]
    no_pytest: bool,

    /// Only build the pytest examples
    #[arg(long)]
    pytest: bool,

    /// Append per-unit size records (JSON lines) to this file
    #[arg(long)]
    collect_size_info: Option<PathBuf>,

    /// Build program invoked per unit
    #[arg(long, default_value = "idf.py")]
    build_command: String,

    /// Additional benign-warning regex, extending the built-in allowlist
    #[arg(long = "ignore-warning")]
    ignore_warning: Vec<String>,

    /// Discover and slice only; record every unit as skipped
    #[arg(long)]
    dry_run: bool,

    /// Show waived warnings and other detail
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: &Cli) -> Result<i32> {
    // All of these are configuration errors and must fail before any build.
    let mut rule_strs: Vec<String> = DEFAULT_CONFIG_RULES.iter().map(|s| s.to_string()).collect();
    rule_strs.extend(cli.config.iter().cloned());
    let config_rules = rules::parse_rules(&rule_strs)?;

    let manifest = Manifest::load(&cli.manifest)?;
    let policy = SelectPolicy::from_flags(cli.pytest, cli.no_pytest)?;

    let mut warning_strs: Vec<String> = DEFAULT_IGNORE_WARNINGS
        .iter()
        .map(|s| s.to_string())
        .collect();
    warning_strs.extend(cli.ignore_warning.iter().cloned());
    let warning_filter = WarningFilter::new(&warning_strs)?;

    let targets = discover::expand_targets(&cli.target);
    let units = discover::find_units(&cli.paths, &targets, &config_rules, &manifest)?;
    let marked = ClassificationSet::pytest_default();
    let selected = select(units, policy, &marked);

    println!(
        "{} Found {} build unit(s) after filtering",
        "✓".green(),
        selected.len()
    );
    println!(
        "  Suggested --parallel-count for this matrix: {}",
        selected.len() / UNITS_PER_JOB + 1
    );

    let shard = take_shard(&selected, cli.parallel_count, cli.parallel_index)?;
    println!(
        "{} Shard {}/{} owns {} unit(s)",
        "✓".green(),
        cli.parallel_index,
        cli.parallel_count,
        shard.len()
    );

    let mut size_sink = match &cli.collect_size_info {
        Some(path) => Some(SizeSink::create(path)?),
        None => None,
    };

    let toolchain =
        CommandToolchain::new(&cli.build_command, cli.collect_size_info.is_some());
    let executor = Executor::new(warning_filter, cli.dry_run, cli.verbose);
    let outcomes = executor.run(&shard, &toolchain, size_sink.as_mut());

    report::print_summary(&outcomes);
    Ok(report::exit_code(&outcomes))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let code = run(&cli)?;
    std::process::exit(code);
}
