//! Persistence for luau-watch: the user config file and per-workspace state.

mod settings;
mod state;

pub use settings::{
    CONFIG_PATH_ENV, ConfigError, LuauWatchConfig, TomlConfigStore, config_path,
};
pub use state::JsonStateStore;
