//! Build units and their outcomes.
//!
//! A [`BuildUnit`] is one concrete (project, target, configuration) instance
//! of the build matrix. The triple is the unit's identity; everything else
//! (build directory, log path, size report path) is derived from it so that
//! two shard processes building the same project for different targets or
//! configs never collide on disk.

use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the per-unit build log inside the build directory.
pub const BUILD_LOG_NAME: &str = "build_log.txt";

/// Name of the per-unit size report inside the build directory.
pub const SIZE_JSON_NAME: &str = "size.json";

/// One (project, target, configuration) combination to be compiled.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildUnit {
    /// Project directory (contains `CMakeLists.txt` and `main/`).
    pub project_dir: PathBuf,
    /// Hardware target identifier, e.g. `esp32h2`.
    pub target: String,
    /// Configuration name, e.g. `default` or a wildcard capture.
    pub config_name: String,
    /// Sdkconfig defaults file for this configuration, relative to the
    /// project directory. `None` for the bare default configuration.
    pub config_file: Option<String>,
}

impl BuildUnit {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        target: impl Into<String>,
        config_name: impl Into<String>,
        config_file: Option<String>,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            target: target.into(),
            config_name: config_name.into(),
            config_file,
        }
    }

    /// Last component of the project directory, used for classification
    /// and reporting.
    pub fn project_name(&self) -> &str {
        self.project_dir
            .file_name()
            .map(|n| n.to_str().unwrap_or(""))
            .unwrap_or("")
    }

    /// Build directory, unique per (target, config) within the project.
    pub fn build_dir(&self) -> PathBuf {
        self.project_dir
            .join(format!("build_{}_{}", self.target, self.config_name))
    }

    pub fn log_path(&self) -> PathBuf {
        self.build_dir().join(BUILD_LOG_NAME)
    }

    pub fn size_json_path(&self) -> PathBuf {
        self.build_dir().join(SIZE_JSON_NAME)
    }

    /// Path to the sdkconfig defaults file, if this configuration has one.
    pub fn config_file_path(&self) -> Option<PathBuf> {
        self.config_file.as_ref().map(|f| self.project_dir.join(f))
    }
}

impl fmt::Display for BuildUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({})",
            self.project_dir.display(),
            self.target,
            self.config_name
        )
    }
}

/// Terminal state of one build unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::Success => write!(f, "success"),
            BuildStatus::Failed => write!(f, "failed"),
            BuildStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of executing (or skipping) one build unit.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub unit: BuildUnit,
    pub status: BuildStatus,
    /// Warning lines that caused a warnings-as-errors failure, or that were
    /// waived by the allowlist. Kept for the report.
    pub warnings: Vec<String>,
}

impl BuildOutcome {
    pub fn new(unit: BuildUnit, status: BuildStatus) -> Self {
        Self {
            unit,
            status,
            warnings: Vec::new(),
        }
    }
}

/// True if `path` looks like a build directory produced by this tool.
/// Discovery uses this to avoid descending into previous build output.
pub fn is_build_dir_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == "build" || n.starts_with("build_"))
}
