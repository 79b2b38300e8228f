//! Toolchain invocation.
//!
//! The core does not compile anything itself; it drives an external build
//! program through the [`Toolchain`] trait. [`CommandToolchain`] is the real
//! implementation, spawning one process per unit and capturing its combined
//! output into the unit's build log. Tests substitute their own
//! implementation at this seam.

use crate::unit::BuildUnit;
use anyhow::{Context, Result};
use std::fs;
use std::process::Command;

/// Raw result of one toolchain invocation. Classification into a
/// [`crate::unit::BuildStatus`] happens in the executor, which also weighs
/// the warning allowlist.
#[derive(Debug)]
pub struct ToolchainRun {
    /// Whether the process exited successfully.
    pub ok: bool,
    /// Combined stdout/stderr, as written to the unit's log file.
    pub log: String,
}

/// The capability "build one unit" supplied to the executor.
pub trait Toolchain {
    fn build(&self, unit: &BuildUnit) -> Result<ToolchainRun>;
}

/// Runs an external build program (by default `idf.py`) per unit:
///
/// ```text
/// <program> -C <project> -B <build_dir> -D SDKCONFIG_DEFAULTS=<file> set-target <t> build
/// ```
///
/// When size collection is requested, each successful build is followed by
///
/// ```text
/// <program> -C <project> -B <build_dir> size --output-format json
/// ```
///
/// whose output lands in the unit's `size.json` for the sink to pick up.
/// A failed size step is noted in the log but does not fail the unit; the
/// executor reports the missing report as a telemetry error.
pub struct CommandToolchain {
    program: String,
    collect_size: bool,
}

impl CommandToolchain {
    pub fn new(program: impl Into<String>, collect_size: bool) -> Self {
        Self {
            program: program.into(),
            collect_size,
        }
    }

    fn write_size_report(&self, unit: &BuildUnit, log: &mut String) {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-C")
            .arg(&unit.project_dir)
            .arg("-B")
            .arg(unit.build_dir())
            .arg("size")
            .arg("--output-format")
            .arg("json");

        match cmd.output() {
            Ok(out) if out.status.success() => {
                if let Err(e) = fs::write(unit.size_json_path(), &out.stdout) {
                    log.push_str(&format!("size report not written: {}\n", e));
                }
            }
            Ok(_) => log.push_str("size report generation failed\n"),
            Err(e) => log.push_str(&format!("size report generation failed: {}\n", e)),
        }
    }
}

impl Toolchain for CommandToolchain {
    fn build(&self, unit: &BuildUnit) -> Result<ToolchainRun> {
        let build_dir = unit.build_dir();
        fs::create_dir_all(&build_dir)
            .with_context(|| format!("Failed to create {}", build_dir.display()))?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("-C")
            .arg(&unit.project_dir)
            .arg("-B")
            .arg(&build_dir);
        if let Some(config_file) = unit.config_file_path() {
            cmd.arg("-D")
                .arg(format!("SDKCONFIG_DEFAULTS={}", config_file.display()));
        }
        cmd.arg("set-target").arg(&unit.target).arg("build");

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute '{}'", self.program))?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() && self.collect_size {
            self.write_size_report(unit, &mut log);
        }

        fs::write(unit.log_path(), &log)
            .with_context(|| format!("Failed to write {}", unit.log_path().display()))?;

        Ok(ToolchainRun {
            ok: output.status.success(),
            log,
        })
    }
}
