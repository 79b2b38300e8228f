//! Size telemetry sink.
//!
//! After a successful build the executor can append one record per unit to
//! a structured sink file, consumed by downstream reporting tooling. Records
//! are JSON lines: identity fields plus the metrics the toolchain wrote to
//! the unit's `size.json`.

use crate::unit::BuildUnit;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct SizeRecord<'a> {
    app: &'a str,
    path: String,
    target: &'a str,
    config: &'a str,
    size: serde_json::Value,
}

/// Append-only record-per-unit size report.
pub struct SizeSink {
    file: File,
}

impl SizeSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open size sink {}", path.display()))?;
        Ok(Self { file })
    }

    /// Read the unit's `size.json` and append one record. Errors here are
    /// telemetry errors: the caller reports them without touching the
    /// unit's build status.
    pub fn record(&mut self, unit: &BuildUnit) -> Result<()> {
        let size_path = unit.size_json_path();
        let text = fs::read_to_string(&size_path)
            .with_context(|| format!("Failed to read {}", size_path.display()))?;
        let metrics: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Malformed size report {}", size_path.display()))?;

        let record = SizeRecord {
            app: unit.project_name(),
            path: unit.project_dir.display().to_string(),
            target: &unit.target,
            config: &unit.config_name,
            size: metrics,
        };
        let line = serde_json::to_string(&record)?;
        writeln!(self.file, "{}", line).context("Failed to append size record")?;
        Ok(())
    }
}
