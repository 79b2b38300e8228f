//! Marked-unit classification.
//!
//! Some example projects are exercised by a separate pytest harness on real
//! hardware and are built in their own CI job. The classification set is a
//! fixed list of (target, project-name) pairs, passed explicitly so nothing
//! here depends on global state.

use crate::unit::BuildUnit;

/// Static (target, project-name) membership list. Fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct ClassificationSet {
    entries: Vec<(String, String)>,
}

impl ClassificationSet {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(t, n)| (t.to_string(), n.to_string()))
                .collect(),
        }
    }

    /// The examples driven by the hardware pytest harness.
    pub fn pytest_default() -> Self {
        Self::new(&[
            ("esp32h2", "esp_zigbee_cli"),
            ("esp32h2", "HA_color_dimmable_light"),
        ])
    }

    /// Pure predicate: unmatched units are simply unmarked.
    pub fn is_marked(&self, unit: &BuildUnit) -> bool {
        self.entries
            .iter()
            .any(|(target, name)| unit.target == *target && unit.project_name() == name)
    }
}
