//! Per-file diagnostics published to the host.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use luau_watch_types::{Diagnostic, Severity};

#[derive(Debug, Default)]
pub struct DiagnosticCollection {
    data: HashMap<PathBuf, Vec<Diagnostic>>,
}

impl DiagnosticCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything published for `path`. An empty set clears the entry.
    pub fn replace(&mut self, path: PathBuf, items: Vec<Diagnostic>) {
        if items.is_empty() {
            self.data.remove(&path);
        } else {
            self.data.insert(path, items);
        }
    }

    pub fn remove(&mut self, path: &Path) {
        self.data.remove(path);
    }

    /// Diagnostics for `path`; empty if none are published.
    #[must_use]
    pub fn get(&self, path: &Path) -> &[Diagnostic] {
        self.data.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let mut files: Vec<(PathBuf, Vec<Diagnostic>)> = self
            .data
            .iter()
            .map(|(path, items)| (path.clone(), items.clone()))
            .collect();

        // Files with errors first, then alphabetically
        files.sort_by(|a, b| {
            let a_has_errors = a.1.iter().any(|d| d.severity().is_error());
            let b_has_errors = b.1.iter().any(|d| d.severity().is_error());
            b_has_errors.cmp(&a_has_errors).then_with(|| a.0.cmp(&b.0))
        });

        DiagnosticsSnapshot { files }
    }
}

/// Immutable copy of the collection for display.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    files: Vec<(PathBuf, Vec<Diagnostic>)>,
}

impl DiagnosticsSnapshot {
    #[must_use]
    pub fn files(&self) -> &[(PathBuf, Vec<Diagnostic>)] {
        &self.files
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn count_by_severity(&self, severity: Severity) -> usize {
        self.files
            .iter()
            .flat_map(|(_, items)| items)
            .filter(|d| d.severity() == severity)
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_by_severity(Severity::Error)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count_by_severity(Severity::Warning)
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.files.iter().map(|(_, items)| items.len()).sum()
    }

    /// Compact status like "E:3 W:5"; empty when there is nothing to report.
    #[must_use]
    pub fn status_string(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!("E:{} W:{}", self.error_count(), self.warning_count())
    }
}
