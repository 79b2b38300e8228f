//! Shard execution.
//!
//! Runs the units of one shard strictly sequentially with keep-going
//! semantics: a broken unit is recorded as failed and the batch moves on,
//! so a CI job covering dozens of independent projects still exercises the
//! rest of its matrix after an early failure.
//!
//! The compiler occasionally emits warnings for symbols that are only used
//! by some configurations; those known-benign lines are waived through an
//! explicit allowlist of regexes so they do not flip a clean build to
//! failed. A non-zero toolchain exit is always a failure, allowlist or not.

use crate::size::SizeSink;
use crate::toolchain::Toolchain;
use crate::unit::{BuildOutcome, BuildStatus, BuildUnit};
use anyhow::{Context, Result};
use colored::*;
use regex::Regex;
use std::fs;

/// Warnings known to be false positives for specific examples.
pub const DEFAULT_IGNORE_WARNINGS: &[&str] = &[
    r"warning: 'init_spiffs' defined but not used",
    r"warning: 'esp_zb_gateway_board_try_update' defined but not used",
];

/// Allowlist of benign warning patterns, matched per warning line.
#[derive(Debug)]
pub struct WarningFilter {
    patterns: Vec<Regex>,
}

impl WarningFilter {
    /// Compile the allowlist. A malformed pattern is a configuration error
    /// and must fail before any build runs.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref())
                    .with_context(|| format!("Invalid warning pattern '{}'", p.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn default_set() -> Self {
        // The built-in patterns are literals; compiling them cannot fail.
        Self::new(DEFAULT_IGNORE_WARNINGS).unwrap_or(Self {
            patterns: Vec::new(),
        })
    }

    pub fn is_benign(&self, warning_line: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(warning_line))
    }

    /// Warning lines in `log` that are NOT covered by the allowlist.
    pub fn offending_warnings(&self, log: &str) -> Vec<String> {
        extract_warnings(log)
            .into_iter()
            .filter(|w| !self.is_benign(w))
            .collect()
    }
}

/// All compiler warning lines in a build log.
pub fn extract_warnings(log: &str) -> Vec<String> {
    log.lines()
        .filter(|l| l.contains("warning:"))
        .map(|l| l.trim().to_string())
        .collect()
}

/// Drives one shard of build units through the toolchain.
pub struct Executor {
    warnings: WarningFilter,
    dry_run: bool,
    verbose: bool,
}

impl Executor {
    pub fn new(warnings: WarningFilter, dry_run: bool, verbose: bool) -> Self {
        Self {
            warnings,
            dry_run,
            verbose,
        }
    }

    /// Build every unit in `shard`, in order, collecting one outcome per
    /// unit. Never returns early: per-unit failures are absorbed into the
    /// outcome list.
    pub fn run(
        &self,
        shard: &[BuildUnit],
        toolchain: &dyn Toolchain,
        mut size_sink: Option<&mut SizeSink>,
    ) -> Vec<BuildOutcome> {
        let total = shard.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, unit) in shard.iter().enumerate() {
            println!("{} [{}/{}] {}", "⚙".cyan(), i + 1, total, unit);

            let outcome = if self.dry_run {
                println!("   {} Skipped (dry run)", "-".dimmed());
                BuildOutcome::new(unit.clone(), BuildStatus::Skipped)
            } else {
                let outcome = self.build_one(unit, toolchain);
                if outcome.status == BuildStatus::Success {
                    self.preserve_sdkconfig(unit);
                    if let Some(sink) = size_sink.as_deref_mut()
                        && let Err(e) = sink.record(unit)
                    {
                        // Telemetry failure never changes build status.
                        println!("{} Size telemetry failed for {}: {:#}", "!".yellow(), unit, e);
                    }
                }
                outcome
            };

            match outcome.status {
                BuildStatus::Success => println!("   {} {}", "✓".green(), unit.project_name()),
                BuildStatus::Failed => println!(
                    "   {} {} (see {})",
                    "x".red(),
                    unit.project_name(),
                    unit.log_path().display()
                ),
                BuildStatus::Skipped => {}
            }
            outcomes.push(outcome);
        }

        outcomes
    }

    fn build_one(&self, unit: &BuildUnit, toolchain: &dyn Toolchain) -> BuildOutcome {
        let run = match toolchain.build(unit) {
            Ok(run) => run,
            Err(e) => {
                println!("{} Toolchain error for {}: {:#}", "x".red(), unit, e);
                return BuildOutcome::new(unit.clone(), BuildStatus::Failed);
            }
        };

        let all_warnings = extract_warnings(&run.log);
        let offending = self.warnings.offending_warnings(&run.log);

        let mut outcome = if !run.ok {
            BuildOutcome::new(unit.clone(), BuildStatus::Failed)
        } else if !offending.is_empty() {
            // Clean exit but real warnings: treated as a failure so CI
            // surfaces them.
            println!(
                "{} {} warning(s) not covered by the allowlist:",
                "!".yellow(),
                offending.len()
            );
            for w in &offending {
                println!("     {}", w.dimmed());
            }
            BuildOutcome::new(unit.clone(), BuildStatus::Failed)
        } else {
            if self.verbose && !all_warnings.is_empty() {
                println!(
                    "   {} {} benign warning(s) waived",
                    "!".yellow(),
                    all_warnings.len()
                );
            }
            BuildOutcome::new(unit.clone(), BuildStatus::Success)
        };

        outcome.warnings = all_warnings;
        outcome
    }

    // Keep the generated sdkconfig next to the build output so the exact
    // configuration behind an artifact stays inspectable.
    fn preserve_sdkconfig(&self, unit: &BuildUnit) {
        let generated = unit.project_dir.join("sdkconfig");
        if !generated.is_file() {
            return;
        }
        let kept = unit.build_dir().join("sdkconfig");
        if let Err(e) = fs::copy(&generated, &kept) {
            println!(
                "{} Could not preserve sdkconfig for {}: {}",
                "!".yellow(),
                unit,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::ToolchainRun;
    use std::cell::RefCell;

    /// Scripted toolchain: pops one canned result per build call.
    struct FakeToolchain {
        script: RefCell<Vec<Result<ToolchainRun>>>,
        calls: RefCell<Vec<BuildUnit>>,
    }

    impl FakeToolchain {
        fn new(script: Vec<Result<ToolchainRun>>) -> Self {
            Self {
                script: RefCell::new(script),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Toolchain for FakeToolchain {
        fn build(&self, unit: &BuildUnit) -> Result<ToolchainRun> {
            self.calls.borrow_mut().push(unit.clone());
            self.script.borrow_mut().remove(0)
        }
    }

    fn unit(name: &str) -> BuildUnit {
        BuildUnit::new(format!("examples/{}", name), "esp32h2", "default", None)
    }

    fn ok_run(log: &str) -> Result<ToolchainRun> {
        Ok(ToolchainRun {
            ok: true,
            log: log.to_string(),
        })
    }

    fn failed_run(log: &str) -> Result<ToolchainRun> {
        Ok(ToolchainRun {
            ok: false,
            log: log.to_string(),
        })
    }

    #[test]
    fn test_allowlisted_warnings_do_not_fail_the_build() {
        let tc = FakeToolchain::new(vec![ok_run(
            "main.c:10: warning: 'init_spiffs' defined but not used\n",
        )]);
        let exec = Executor::new(WarningFilter::default_set(), false, false);
        let outcomes = exec.run(&[unit("gw")], &tc, None);

        assert_eq!(outcomes[0].status, BuildStatus::Success);
        assert_eq!(outcomes[0].warnings.len(), 1);
    }

    #[test]
    fn test_unlisted_warning_fails_a_clean_exit() {
        let tc = FakeToolchain::new(vec![ok_run(
            "main.c:10: warning: unused variable 'x'\n",
        )]);
        let exec = Executor::new(WarningFilter::default_set(), false, false);
        let outcomes = exec.run(&[unit("gw")], &tc, None);
        assert_eq!(outcomes[0].status, BuildStatus::Failed);
    }

    #[test]
    fn test_keep_going_past_a_failed_unit() {
        let tc = FakeToolchain::new(vec![
            failed_run("main.c:1: error: expected ';'\n"),
            ok_run(""),
            ok_run(""),
        ]);
        let exec = Executor::new(WarningFilter::default_set(), false, false);
        let shard = vec![unit("a"), unit("b"), unit("c")];
        let outcomes = exec.run(&shard, &tc, None);

        // All three units were attempted despite the first failure.
        assert_eq!(tc.calls.borrow().len(), 3);
        assert_eq!(outcomes[0].status, BuildStatus::Failed);
        assert_eq!(outcomes[1].status, BuildStatus::Success);
        assert_eq!(outcomes[2].status, BuildStatus::Success);
    }

    #[test]
    fn test_toolchain_error_is_isolated_too() {
        let tc = FakeToolchain::new(vec![
            Err(anyhow::anyhow!("spawn failed")),
            ok_run(""),
        ]);
        let exec = Executor::new(WarningFilter::default_set(), false, false);
        let outcomes = exec.run(&[unit("a"), unit("b")], &tc, None);
        assert_eq!(outcomes[0].status, BuildStatus::Failed);
        assert_eq!(outcomes[1].status, BuildStatus::Success);
    }

    #[test]
    fn test_dry_run_skips_without_invoking_the_toolchain() {
        let tc = FakeToolchain::new(vec![]);
        let exec = Executor::new(WarningFilter::default_set(), true, false);
        let outcomes = exec.run(&[unit("a"), unit("b")], &tc, None);
        assert!(tc.calls.borrow().is_empty());
        assert!(
            outcomes
                .iter()
                .all(|o| o.status == BuildStatus::Skipped)
        );
    }

    #[test]
    fn test_failed_exit_trumps_allowlist() {
        let tc = FakeToolchain::new(vec![failed_run(
            "main.c:10: warning: 'init_spiffs' defined but not used\n",
        )]);
        let exec = Executor::new(WarningFilter::default_set(), false, false);
        let outcomes = exec.run(&[unit("a")], &tc, None);
        assert_eq!(outcomes[0].status, BuildStatus::Failed);
    }

    #[test]
    fn test_telemetry_failure_does_not_change_status() {
        let tc = FakeToolchain::new(vec![ok_run("")]);
        let exec = Executor::new(WarningFilter::default_set(), false, false);

        let tmp = tempfile::tempdir().unwrap();
        let mut sink = SizeSink::create(&tmp.path().join("sizes.jsonl")).unwrap();
        // The unit has no size.json, so the record call fails.
        let outcomes = exec.run(&[unit("a")], &tc, Some(&mut sink));
        assert_eq!(outcomes[0].status, BuildStatus::Success);
    }

    #[test]
    fn test_bad_warning_pattern_is_a_config_error() {
        assert!(WarningFilter::new(&["warning: ("]).is_err());
    }
}
