//! Resolved analyzer settings.
//!
//! [`RawSettings`] is the deserialization boundary: every field optional, as
//! read from the configuration store. [`Settings`] is the validated snapshot
//! the analyzer works against. The only repair performed on the way in is the
//! empty-command fallback, which callers must persist back to the store.

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_ANALYZER_COMMAND: &str = "luau-analyze";
pub const DEFAULT_ROJO_PROJECT: &str = "default.project.json";
pub const DEFAULT_TYPE_DEFINITIONS: &str = "globalTypes.d.lua";

/// Settings as stored, before defaults are applied.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawSettings {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub rojo_project: Option<PathBuf>,
    #[serde(default)]
    pub type_definitions: Option<PathBuf>,
    #[serde(default)]
    pub uses_rojo: bool,
    #[serde(default)]
    pub ignored_paths: Vec<String>,
}

/// Immutable settings snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    analyzer_command: String,
    rojo_project: PathBuf,
    type_definitions: PathBuf,
    uses_rojo: bool,
    ignored_paths: Vec<String>,
}

/// Outcome of [`Settings::resolve`].
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: Settings,
    /// The configured command was empty and has been replaced with
    /// [`DEFAULT_ANALYZER_COMMAND`].
    pub command_repaired: bool,
}

impl Settings {
    /// Apply defaults to a raw settings value.
    ///
    /// An absent command takes the default silently. A present but blank
    /// command is a misconfiguration: it is replaced too, and flagged.
    #[must_use]
    pub fn resolve(raw: RawSettings) -> ResolvedSettings {
        let (analyzer_command, command_repaired) = match raw.command {
            None => (DEFAULT_ANALYZER_COMMAND.to_string(), false),
            Some(cmd) if cmd.trim().is_empty() => (DEFAULT_ANALYZER_COMMAND.to_string(), true),
            Some(cmd) => (cmd, false),
        };

        let settings = Self {
            analyzer_command,
            rojo_project: raw
                .rojo_project
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROJO_PROJECT)),
            type_definitions: raw
                .type_definitions
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TYPE_DEFINITIONS)),
            uses_rojo: raw.uses_rojo,
            ignored_paths: raw.ignored_paths,
        };

        ResolvedSettings {
            settings,
            command_repaired,
        }
    }

    #[must_use]
    pub fn analyzer_command(&self) -> &str {
        &self.analyzer_command
    }

    /// Configured project file, used when no project file has been resolved.
    #[must_use]
    pub fn rojo_project(&self) -> &PathBuf {
        &self.rojo_project
    }

    /// Configured type definitions file, used when none has been resolved.
    #[must_use]
    pub fn type_definitions(&self) -> &PathBuf {
        &self.type_definitions
    }

    #[must_use]
    pub fn uses_rojo(&self) -> bool {
        self.uses_rojo
    }

    #[must_use]
    pub fn ignored_paths(&self) -> &[String] {
        &self.ignored_paths
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(RawSettings::default()).settings
    }
}
