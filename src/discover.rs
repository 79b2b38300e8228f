//! Project discovery.
//!
//! Walks a set of root paths, locates buildable example projects, and
//! expands each into one [`BuildUnit`] per (target, configuration) pair,
//! consulting the manifest before emitting a unit. Traversal is read-only.
//!
//! A project is a directory holding a `CMakeLists.txt` and a `main/`
//! subdirectory. Directories missing that descriptor are recursed through;
//! unreadable directories are reported and skipped, never fatal. The result
//! is deduplicated and sorted lexically by (path, target, config) so that
//! downstream sharding is reproducible across re-runs.

use crate::manifest::Manifest;
use crate::rules::{ConfigRule, resolve_configs};
use crate::unit::{BuildUnit, is_build_dir_name};
use anyhow::{Result, bail};
use colored::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Hardware targets the toolchain can compile for. `--target all` expands
/// to this list.
pub const KNOWN_TARGETS: &[&str] = &[
    "esp32", "esp32s2", "esp32s3", "esp32c2", "esp32c3", "esp32c6", "esp32h2",
];

/// Expand the target filter into concrete target identifiers.
pub fn expand_targets(filter: &str) -> Vec<String> {
    if filter == "all" {
        KNOWN_TARGETS.iter().map(|t| t.to_string()).collect()
    } else {
        vec![filter.to_string()]
    }
}

/// Key for deduplication: the (project, target, config) identity triple.
/// The build directory name is derived from exactly these fields.
type UnitKey = (PathBuf, String, String);

/// Discover every build unit reachable under `roots` for the given targets
/// and configuration rules.
///
/// Units are deduplicated on their identity triple after manifest renames.
/// Two configurations of the same project collapsing to one name is a fatal
/// configuration error: they would share a build directory and the second
/// build would clobber the first's artifacts and log.
pub fn find_units(
    roots: &[PathBuf],
    targets: &[String],
    rules: &[ConfigRule],
    manifest: &Manifest,
) -> Result<Vec<BuildUnit>> {
    let mut units: BTreeMap<UnitKey, BuildUnit> = BTreeMap::new();

    for root in roots {
        if !root.exists() {
            println!(
                "{} Skipping missing path {}",
                "!".yellow(),
                root.display()
            );
            continue;
        }
        for project_dir in find_project_dirs(root) {
            expand_project(&project_dir, targets, rules, manifest, &mut units)?;
        }
    }

    Ok(units.into_values().collect())
}

fn expand_project(
    project_dir: &Path,
    targets: &[String],
    rules: &[ConfigRule],
    manifest: &Manifest,
    units: &mut BTreeMap<UnitKey, BuildUnit>,
) -> Result<()> {
    let configs = resolve_configs(rules, project_dir);

    for target in targets {
        if !manifest.allows(project_dir, target) {
            continue;
        }
        for config in &configs {
            let name = manifest.rename_config(project_dir, &config.name);
            let unit = BuildUnit::new(
                project_dir,
                target.clone(),
                name.clone(),
                config.file.clone(),
            );
            let key: UnitKey = (project_dir.to_path_buf(), target.clone(), name);

            if let Some(existing) = units.get(&key) {
                // Same project seen twice (e.g. overlapping roots) is fine;
                // distinct config files mapped onto one name is not.
                if existing.config_file != unit.config_file {
                    bail!(
                        "configs '{}' and '{}' of {} both build as '{}' after manifest renames, so their build directory {} would collide",
                        existing.config_file.as_deref().unwrap_or("<default>"),
                        unit.config_file.as_deref().unwrap_or("<default>"),
                        project_dir.display(),
                        key.2,
                        unit.build_dir().display()
                    );
                }
                continue;
            }
            units.insert(key, unit);
        }
    }
    Ok(())
}

/// All project directories under `root`, in walk order. Previous build
/// output and hidden directories are pruned.
fn find_project_dirs(root: &Path) -> Vec<PathBuf> {
    let mut projects = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_prune(e.path()));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                println!("{} Skipping unreadable entry: {}", "!".yellow(), err);
                continue;
            }
        };
        if entry.file_type().is_dir() && is_project_dir(entry.path()) {
            projects.push(entry.path().to_path_buf());
        }
    }

    projects
}

fn is_project_dir(path: &Path) -> bool {
    path.join("CMakeLists.txt").is_file() && path.join("main").is_dir()
}

fn should_prune(path: &Path) -> bool {
    if is_build_dir_name(path) {
        return true;
    }
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n != "." && n != "..");
    hidden
        || path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n == "managed_components")
}
