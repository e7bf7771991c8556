//! Terminal implementation of the analyzer host.
//!
//! Errors go to stderr, documents to stdout, and selection prompts are read
//! from stdin when it is a terminal. Non-interactive runs dismiss prompts.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use luau_watch_analyzer::{
    ConfigSource, Notifier, PickItem, Picker, StateStore, TypeInstaller, Workspace,
};
use luau_watch_config::{JsonStateStore, TomlConfigStore};
use luau_watch_types::{DEFAULT_TYPE_DEFINITIONS, RawSettings};

pub struct TerminalHost {
    roots: Vec<PathBuf>,
    config: TomlConfigStore,
    state: JsonStateStore,
    interactive: bool,
    /// Definitions file copied into the workspace by `install_types`.
    type_source: Option<PathBuf>,
}

impl TerminalHost {
    pub fn new(root: PathBuf, config: TomlConfigStore) -> Self {
        let state = JsonStateStore::for_workspace(&root);
        Self {
            roots: vec![root],
            config,
            state,
            interactive: io::stdin().is_terminal(),
            type_source: None,
        }
    }

    #[must_use]
    pub fn with_type_source(mut self, source: PathBuf) -> Self {
        self.type_source = Some(source);
        self
    }

    #[cfg(test)]
    fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn config_path(&self) -> &Path {
        self.config.path()
    }

    fn prompt(title: &str, items: &[PickItem]) -> io::Result<Option<usize>> {
        let mut err = io::stderr().lock();
        writeln!(err, "{title}:")?;
        for (i, item) in items.iter().enumerate() {
            writeln!(err, "  {}) {}  ({})", i + 1, item.label, item.description)?;
        }
        write!(err, "Select 1-{} (empty to skip): ", items.len())?;
        err.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(parse_choice(&line, items.len()))
    }
}

/// 1-based selection; anything else dismisses.
fn parse_choice(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

impl Workspace for TerminalHost {
    fn roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }
}

impl Picker for TerminalHost {
    fn pick(&mut self, title: &str, items: &[PickItem]) -> Option<usize> {
        if !self.interactive {
            tracing::info!(title, candidates = items.len(), "Skipping prompt; stdin is not a terminal");
            return None;
        }
        Self::prompt(title, items).unwrap_or_else(|e| {
            tracing::warn!("Prompt failed: {e}");
            None
        })
    }
}

impl StateStore for TerminalHost {
    fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.state.get_path(key)
    }

    fn set_path(&mut self, key: &str, value: Option<&Path>) -> Result<()> {
        self.state.set_path(key, value)
    }
}

impl ConfigSource for TerminalHost {
    fn load_settings(&self) -> Result<RawSettings> {
        self.config.load_settings()
    }

    fn persist_analyzer_command(&mut self, command: &str) -> Result<()> {
        self.config.persist_analyzer_command(command)
    }
}

impl Notifier for TerminalHost {
    fn show_error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }

    fn show_document(&mut self, _language: &str, content: &str) {
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{content}") {
            tracing::warn!("Failed to write document: {e}");
        }
    }
}

impl TypeInstaller for TerminalHost {
    fn install_types(&mut self, roots: &[PathBuf]) -> Result<PathBuf> {
        let Some(source) = &self.type_source else {
            bail!("no type definitions source given");
        };
        let Some(root) = roots.first() else {
            bail!("no workspace folder is open");
        };

        let dest = root.join(DEFAULT_TYPE_DEFINITIONS);
        fs::copy(source, &dest).with_context(|| {
            format!("copying {} to {}", source.display(), dest.display())
        })?;
        println!("Installed type definitions to {}", dest.display());
        Ok(dest)
    }
}
