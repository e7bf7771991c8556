//! Diagnostics produced by the external analyzer.

use std::fmt;
use std::path::Path;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl Severity {
    /// Map an analyzer category label (`TypeError`, `SyntaxError`, a lint name)
    /// onto a severity.
    ///
    /// `TypeError`/`SyntaxError` are errors. Lints are reported under their
    /// lint name (`LocalUnused`, `UnknownGlobal`, ...) and map to warnings.
    #[must_use]
    pub fn from_category(category: &str) -> Self {
        if category.ends_with("Error") {
            Self::Error
        } else if matches!(category, "Info" | "Information" | "Note") {
            Self::Information
        } else {
            Self::Warning
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
            Self::Hint => "hint",
        }
    }
}

/// 0-indexed line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width range anchored at `pos`.
    #[must_use]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// A single reported issue.
///
/// Fields are private; the analyzer output parser is the construction path
/// in production, tests use [`Diagnostic::new`] directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    range: Range,
    severity: Severity,
    /// Analyzer label, e.g. `TypeError` or `LocalUnused`.
    category: String,
    message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(range: Range, severity: Severity, category: String, message: String) -> Self {
        Self {
            range,
            severity,
            category,
            message,
        }
    }

    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Format as `path:line:col: severity: [category] message` (1-indexed).
    #[must_use]
    pub fn display_with_path(&self, path: &Path) -> String {
        format!("{}:{self}", path.display())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: [{}] {}",
            self.range.start.line + 1,
            self.range.start.character + 1,
            self.severity.label(),
            self.category,
            self.message,
        )
    }
}
