//! Core domain types for luau-watch.
//!
//! Pure types with no IO and no async: diagnostics as reported by the
//! analyzer, and the settings snapshot every analyzer run is built from.

mod diagnostic;
mod settings;

pub use diagnostic::{Diagnostic, Position, Range, Severity};
pub use settings::{
    DEFAULT_ANALYZER_COMMAND, DEFAULT_ROJO_PROJECT, DEFAULT_TYPE_DEFINITIONS, RawSettings,
    ResolvedSettings, Settings,
};

/// Source file extensions the analyzer understands.
pub const SOURCE_EXTENSIONS: &[&str] = &["lua", "luau"];

/// Whether `path` names a Luau source file.
#[must_use]
pub fn is_source_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}
