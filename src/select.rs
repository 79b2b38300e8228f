//! Inclusion policy over discovered units.

use crate::classify::ClassificationSet;
use crate::unit::BuildUnit;
use anyhow::{Result, bail};

/// Which subset of the discovered list to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectPolicy {
    All,
    OnlyMarked,
    ExcludeMarked,
}

impl SelectPolicy {
    /// Map the `--pytest` / `--no-pytest` flags to a policy. Requesting both
    /// is a configuration error, checked here again even though the CLI
    /// already declares the flags as conflicting.
    pub fn from_flags(only_marked: bool, exclude_marked: bool) -> Result<Self> {
        match (only_marked, exclude_marked) {
            (true, true) => bail!("--pytest and --no-pytest are mutually exclusive"),
            (true, false) => Ok(SelectPolicy::OnlyMarked),
            (false, true) => Ok(SelectPolicy::ExcludeMarked),
            (false, false) => Ok(SelectPolicy::All),
        }
    }
}

/// Apply the policy, preserving input order. `All` is the identity.
pub fn select(
    units: Vec<BuildUnit>,
    policy: SelectPolicy,
    marked: &ClassificationSet,
) -> Vec<BuildUnit> {
    match policy {
        SelectPolicy::All => units,
        SelectPolicy::OnlyMarked => units.into_iter().filter(|u| marked.is_marked(u)).collect(),
        SelectPolicy::ExcludeMarked => {
            units.into_iter().filter(|u| !marked.is_marked(u)).collect()
        }
    }
}
