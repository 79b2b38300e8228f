//! Manifest rule files.
//!
//! A manifest constrains which (project, target) combinations are valid and
//! may rewrite configuration names. It is consumed, not owned, by discovery:
//! every candidate build unit is checked against the loaded rules before it
//! is emitted.
//!
//! Rule files are TOML:
//!
//! ```toml
//! [[rule]]
//! paths = ["*/esp_zigbee_gateway"]
//! enable = ["esp32h2", "esp32c6"]
//!
//! [[rule]]
//! paths = ["*/HA_*"]
//! disable = ["esp32"]
//! rename = { default = "ha_default" }
//! ```
//!
//! `paths` globs are matched against the project path with `/` separators;
//! `*` matches any run of characters, including separators. A non-empty
//! `enable` list allows only the named targets; `disable` removes targets
//! from whatever is otherwise allowed. A malformed manifest is a fatal
//! configuration error reported before any build begins.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
struct ManifestFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    paths: Vec<String>,
    #[serde(default)]
    enable: Vec<String>,
    #[serde(default)]
    disable: Vec<String>,
    #[serde(default)]
    rename: std::collections::BTreeMap<String, String>,
}

#[derive(Debug)]
struct ManifestRule {
    patterns: Vec<Regex>,
    enable: Vec<String>,
    disable: Vec<String>,
    rename: std::collections::BTreeMap<String, String>,
}

impl ManifestRule {
    fn matches(&self, project_path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(project_path))
    }
}

/// All rules loaded at startup, in file order. Read-only for the run.
#[derive(Debug, Default)]
pub struct Manifest {
    rules: Vec<ManifestRule>,
}

impl Manifest {
    /// Load and validate one or more manifest files.
    pub fn load<P: AsRef<Path>>(files: &[P]) -> Result<Self> {
        let mut rules = Vec::new();
        for file in files {
            let file = file.as_ref();
            let text = fs::read_to_string(file)
                .with_context(|| format!("Failed to read manifest {}", file.display()))?;
            let parsed: ManifestFile = toml::from_str(&text)
                .with_context(|| format!("Failed to parse manifest {}", file.display()))?;
            for raw in parsed.rules {
                rules.push(compile_rule(raw, file)?);
            }
        }
        Ok(Self { rules })
    }

    /// True if the manifest allows building `project_path` for `target`.
    pub fn allows(&self, project_path: &Path, target: &str) -> bool {
        let path = normalize(project_path);
        for rule in self.rules.iter().filter(|r| r.matches(&path)) {
            if !rule.enable.is_empty() && !rule.enable.iter().any(|t| t == target) {
                return false;
            }
            if rule.disable.iter().any(|t| t == target) {
                return false;
            }
        }
        true
    }

    /// Configuration name after any manifest rewrites. Later rules win.
    pub fn rename_config(&self, project_path: &Path, config_name: &str) -> String {
        let path = normalize(project_path);
        let mut name = config_name.to_string();
        for rule in self.rules.iter().filter(|r| r.matches(&path)) {
            if let Some(renamed) = rule.rename.get(&name) {
                name = renamed.clone();
            }
        }
        name
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile_rule(raw: RawRule, file: &Path) -> Result<ManifestRule> {
    let mut patterns = Vec::new();
    for glob in &raw.paths {
        patterns.push(glob_to_regex(glob).with_context(|| {
            format!("Invalid path glob '{}' in manifest {}", glob, file.display())
        })?);
    }
    Ok(ManifestRule {
        patterns,
        enable: raw.enable,
        disable: raw.disable,
        rename: raw.rename,
    })
}

fn glob_to_regex(glob: &str) -> Result<Regex> {
    let mut pattern = String::from("^");
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            c => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(Into::into)
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
