//! The user configuration file.

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use luau_watch_analyzer::ConfigSource;
use luau_watch_types::RawSettings;
use serde::Deserialize;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "LUAU_WATCH_CONFIG";

const ANALYZER_TABLE: &str = "analyzer";

/// Top-level layout of `config.toml`.
///
/// ```toml
/// [analyzer]
/// command = "luau-analyze"
/// uses_rojo = true
/// rojo_project = "default.project.json"
/// type_definitions = "globalTypes.d.lua"
/// ignored_paths = ["Packages"]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct LuauWatchConfig {
    pub analyzer: Option<RawSettings>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Default config location: `$LUAU_WATCH_CONFIG`, else `~/.luau-watch/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".luau-watch").join("config.toml"))
}

/// Analyzer settings backed by a TOML file.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at [`config_path`], if a location can be determined.
    #[must_use]
    pub fn from_default_location() -> Option<Self> {
        config_path().map(Self::new)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the `[analyzer]` table. A missing file or table yields defaults.
    pub fn load(&self) -> Result<RawSettings, ConfigError> {
        if !self.path.exists() {
            return Ok(RawSettings::default());
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", self.path, err);
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source: err,
                });
            }
        };

        match toml::from_str::<LuauWatchConfig>(&content) {
            Ok(config) => Ok(config.analyzer.unwrap_or_default()),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", self.path, err);
                Err(ConfigError::Parse {
                    path: self.path.clone(),
                    source: err,
                })
            }
        }
    }

    /// Write `analyzer.command`, preserving comments and other settings.
    ///
    /// Creates the file and its parent directory if they don't exist.
    pub fn persist_command(&self, command: &str) -> io::Result<()> {
        let content = if self.path.exists() {
            fs::read_to_string(&self.path)?
        } else {
            String::new()
        };

        let mut doc = content
            .parse::<toml_edit::DocumentMut>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if !doc.contains_key(ANALYZER_TABLE) {
            doc[ANALYZER_TABLE] = toml_edit::Item::Table(toml_edit::Table::new());
        }
        doc[ANALYZER_TABLE]["command"] = toml_edit::value(command);

        luau_watch_utils::atomic_write(&self.path, doc.to_string().as_bytes())?;
        tracing::info!(path = %self.path.display(), command, "Persisted analyzer command");
        Ok(())
    }
}

impl ConfigSource for TomlConfigStore {
    fn load_settings(&self) -> anyhow::Result<RawSettings> {
        Ok(self.load()?)
    }

    fn persist_analyzer_command(&mut self, command: &str) -> anyhow::Result<()> {
        Ok(self.persist_command(command)?)
    }
}
