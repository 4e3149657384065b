//! Per-file and per-module churn aggregation.
//!
//! A file's module is its parent directory; files at the repository root
//! belong to the `"."` module.

use std::collections::BTreeMap;
use std::path::Path;

use inflow_core::InflowError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::mining::NumstatEntry;

/// Line counts for a file or module.
///
/// # Examples
///
/// ```
/// use inflow_churn::ChurnMetrics;
///
/// let mut m = ChurnMetrics::default();
/// m.record(5, 2);
/// assert_eq!(m.total_churn, 7);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnMetrics {
    /// Lines added.
    pub added: u64,
    /// Lines removed.
    pub removed: u64,
    /// `added + removed`.
    pub total_churn: u64,
}

impl ChurnMetrics {
    /// Add one commit's counts.
    pub fn record(&mut self, added: u64, removed: u64) {
        self.added += added;
        self.removed += removed;
        self.total_churn = self.added + self.removed;
    }
}

/// Churn for every touched file and module.
///
/// Serializes as `{"files": {...}, "modules": {...}}` with keys in path order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnReport {
    /// Per-file metrics keyed by repo-relative path.
    pub files: BTreeMap<String, ChurnMetrics>,
    /// Per-module metrics keyed by parent directory.
    pub modules: BTreeMap<String, ChurnMetrics>,
}

impl ChurnReport {
    /// The `n` files with the highest total churn, ties broken by path.
    pub fn top_files(&self, n: usize) -> Vec<(&str, &ChurnMetrics)> {
        let mut ranked = rank(&self.files);
        ranked.truncate(n);
        ranked
    }

    /// Every module, highest total churn first.
    pub fn modules_by_churn(&self) -> Vec<(&str, &ChurnMetrics)> {
        rank(&self.modules)
    }

    /// Sum over all files.
    pub fn total(&self) -> ChurnMetrics {
        let mut total = ChurnMetrics::default();
        for m in self.files.values() {
            total.record(m.added, m.removed);
        }
        total
    }

    /// Write the report as pretty-printed JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`InflowError::Io`] if the file cannot be written.
    pub fn save_json(&self, path: &Path) -> Result<(), InflowError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(
            path = %path.display(),
            files = self.files.len(),
            modules = self.modules.len(),
            "saved churn report"
        );
        Ok(())
    }
}

fn rank(map: &BTreeMap<String, ChurnMetrics>) -> Vec<(&str, &ChurnMetrics)> {
    let mut ranked: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
    // BTreeMap order is already by key, so a stable sort keeps ties by path.
    ranked.sort_by(|a, b| b.1.total_churn.cmp(&a.1.total_churn));
    ranked
}

/// The module a file belongs to: its parent directory, or `"."` at the root.
///
/// # Examples
///
/// ```
/// use inflow_churn::churn::module_of;
///
/// assert_eq!(module_of("src/engine/mod.rs"), "src/engine");
/// assert_eq!(module_of("README.md"), ".");
/// ```
pub fn module_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => ".",
        Some(idx) => &path[..idx],
    }
}

/// Sum numstat entries into per-file and per-module churn.
///
/// # Examples
///
/// ```
/// use inflow_churn::{aggregate, NumstatEntry};
///
/// let entries = vec![
///     NumstatEntry { commit: "a".into(), path: "src/a.rs".into(), added: 4, removed: 1 },
///     NumstatEntry { commit: "b".into(), path: "src/b.rs".into(), added: 2, removed: 2 },
/// ];
/// let report = aggregate(&entries);
/// assert_eq!(report.modules["src"].total_churn, 9);
/// ```
pub fn aggregate(entries: &[NumstatEntry]) -> ChurnReport {
    let mut report = ChurnReport::default();
    for entry in entries {
        report
            .files
            .entry(entry.path.clone())
            .or_default()
            .record(entry.added, entry.removed);
        report
            .modules
            .entry(module_of(&entry.path).to_string())
            .or_default()
            .record(entry.added, entry.removed);
    }
    report
}
