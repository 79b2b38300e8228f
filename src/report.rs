//! Outcome aggregation.
//!
//! Reduces the per-unit outcomes of one shard to the single exit status the
//! CI layer acts on, and prints a summary table. There is no retry logic
//! here; a failed shard is simply re-run by the invoking CI job.

use crate::ui::Table;
use crate::unit::{BuildOutcome, BuildStatus};
use colored::*;

/// Zero iff no outcome failed. Skipped units count as clean.
pub fn exit_code(outcomes: &[BuildOutcome]) -> i32 {
    let failed = outcomes
        .iter()
        .any(|o| o.status == BuildStatus::Failed);
    i32::from(failed)
}

/// Print the per-unit summary and totals for one shard.
pub fn print_summary(outcomes: &[BuildOutcome]) {
    if outcomes.is_empty() {
        println!("{} Nothing to build in this shard", "✓".green());
        return;
    }

    let mut table = Table::new(&["Status", "Project", "Target", "Config"]);
    for o in outcomes {
        let status = match o.status {
            BuildStatus::Success => "✓".green().to_string(),
            BuildStatus::Failed => "x".red().to_string(),
            BuildStatus::Skipped => "-".dimmed().to_string(),
        };
        table.add_row(vec![
            status,
            o.unit.project_name().to_string(),
            o.unit.target.clone(),
            o.unit.config_name.clone(),
        ]);
    }
    table.print();

    let count = |s: BuildStatus| outcomes.iter().filter(|o| o.status == s).count();
    let succeeded = count(BuildStatus::Success);
    let failed = count(BuildStatus::Failed);
    let skipped = count(BuildStatus::Skipped);

    if failed > 0 {
        println!(
            "{} {} built, {} failed, {} skipped",
            "x".red(),
            succeeded,
            failed,
            skipped
        );
    } else {
        println!(
            "{} {} built, {} skipped",
            "✓".green(),
            succeeded,
            skipped
        );
    }
}
