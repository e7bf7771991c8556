//! Host-editor boundary.
//!
//! The orchestrator never talks to an editor, terminal, or config file
//! directly. Each capability it needs from its surroundings is one small
//! trait here; [`Host`] is their union and is implemented automatically.

use std::path::{Path, PathBuf};

use luau_watch_types::RawSettings;

/// One entry in a selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    /// File name.
    pub label: String,
    /// Workspace root the file lives in.
    pub description: String,
    pub path: PathBuf,
}

/// Workspace folders currently open.
pub trait Workspace {
    fn roots(&self) -> Vec<PathBuf>;
}

/// Single-selection prompt.
pub trait Picker {
    /// Returns the index of the chosen item, or `None` if dismissed.
    fn pick(&mut self, title: &str, items: &[PickItem]) -> Option<usize>;
}

/// Persistent per-workspace key/value state.
pub trait StateStore {
    fn get_path(&self, key: &str) -> Option<PathBuf>;
    /// `None` clears the key.
    fn set_path(&mut self, key: &str, value: Option<&Path>) -> anyhow::Result<()>;
}

/// The configuration store.
pub trait ConfigSource {
    fn load_settings(&self) -> anyhow::Result<RawSettings>;
    fn persist_analyzer_command(&mut self, command: &str) -> anyhow::Result<()>;
}

/// User-facing output.
pub trait Notifier {
    fn show_error(&mut self, message: &str);
    /// Open read-only text in the editor (source maps, annotated source).
    fn show_document(&mut self, language: &str, content: &str);
}

/// Installs Roblox type definitions into the workspace.
pub trait TypeInstaller {
    /// Returns the absolute path of the installed definitions file.
    fn install_types(&mut self, roots: &[PathBuf]) -> anyhow::Result<PathBuf>;
}

pub trait Host: Workspace + Picker + StateStore + ConfigSource + Notifier + TypeInstaller {}

impl<T> Host for T where T: Workspace + Picker + StateStore + ConfigSource + Notifier + TypeInstaller {}
