//! Configuration-rule strings.
//!
//! A rule describes how sdkconfig files in a project map to named build
//! configurations. Three forms are accepted, mirroring the conventional CI
//! scheme:
//!
//! ```text
//! sdkconfig.ci=default    FILENAME=NAME   use this file, call the config NAME
//! sdkconfig.ci.*=         FILEPATTERN     one wildcard; the capture names the config
//! =default                =NAME           default label, no sdkconfig file
//! ```
//!
//! Rules are evaluated in the order supplied; the first rule that matches
//! anything in a project wins for that project. A project matching no rule
//! yields zero configurations, which is not an error.

use anyhow::{Result, bail};
use std::fs;
use std::path::Path;

/// One parsed configuration rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigRule {
    /// `FILENAME=NAME`: exact file, explicit config name.
    Exact { file: String, name: String },
    /// `FILEPATTERN` with one `*`; the captured part names the config.
    Wildcard { prefix: String, suffix: String },
    /// `=NAME`: no sdkconfig file, fixed config name.
    Default { name: String },
}

/// A named configuration resolved for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub name: String,
    /// Sdkconfig file relative to the project directory, when the rule
    /// names one.
    pub file: Option<String>,
}

/// Parse a rule string. Malformed rules are a configuration error and must
/// surface before any build starts.
pub fn parse_rule(rule: &str) -> Result<ConfigRule> {
    let (file_part, name_part) = match rule.split_once('=') {
        Some((f, n)) => (f, Some(n)),
        None => (rule, None),
    };

    if file_part.is_empty() {
        let name = name_part.unwrap_or("");
        if name.is_empty() {
            bail!("invalid config rule '{}': default rule needs a name", rule);
        }
        return Ok(ConfigRule::Default {
            name: name.to_string(),
        });
    }

    let wildcards = file_part.matches('*').count();
    match wildcards {
        0 => {
            // Explicit name, or re-use the file name when none is given.
            let name = match name_part {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => file_part.to_string(),
            };
            Ok(ConfigRule::Exact {
                file: file_part.to_string(),
                name,
            })
        }
        1 => {
            if name_part.is_some_and(|n| !n.is_empty()) {
                bail!(
                    "invalid config rule '{}': a wildcard pattern names its configs from the capture",
                    rule
                );
            }
            let (prefix, suffix) = file_part
                .split_once('*')
                .map(|(p, s)| (p.to_string(), s.to_string()))
                .unwrap_or_default();
            Ok(ConfigRule::Wildcard { prefix, suffix })
        }
        _ => bail!(
            "invalid config rule '{}': at most one wildcard is allowed",
            rule
        ),
    }
}

pub fn parse_rules(rules: &[String]) -> Result<Vec<ConfigRule>> {
    rules.iter().map(|r| parse_rule(r)).collect()
}

/// Resolve the configurations for one project directory. Rules are tried in
/// order; the first one producing any configuration wins. Matches within a
/// wildcard rule are sorted by capture for reproducible discovery order.
pub fn resolve_configs(rules: &[ConfigRule], project_dir: &Path) -> Vec<ResolvedConfig> {
    for rule in rules {
        let mut found = match rule {
            ConfigRule::Exact { file, name } => {
                if project_dir.join(file).is_file() {
                    vec![ResolvedConfig {
                        name: name.clone(),
                        file: Some(file.clone()),
                    }]
                } else {
                    Vec::new()
                }
            }
            ConfigRule::Wildcard { prefix, suffix } => {
                wildcard_matches(project_dir, prefix, suffix)
            }
            ConfigRule::Default { name } => vec![ResolvedConfig {
                name: name.clone(),
                file: None,
            }],
        };
        if !found.is_empty() {
            found.sort_by(|a, b| a.name.cmp(&b.name));
            return found;
        }
    }
    Vec::new()
}

fn wildcard_matches(project_dir: &Path, prefix: &str, suffix: &str) -> Vec<ResolvedConfig> {
    let Ok(entries) = fs::read_dir(project_dir) else {
        return Vec::new();
    };

    let mut configs = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        if !entry.path().is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.len() <= prefix.len() + suffix.len() {
            continue; // empty capture would make an unnamed config
        }
        if let Some(rest) = name.strip_prefix(prefix)
            && let Some(capture) = rest.strip_suffix(suffix)
        {
            configs.push(ResolvedConfig {
                name: capture.to_string(),
                file: Some(name.to_string()),
            });
        }
    }
    configs
}
