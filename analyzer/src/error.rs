//! Error types at the analyzer boundary.

use std::io;

/// The analyzer process could not be run to completion.
///
/// This is distinct from a run that started and exited non-zero: the analyzer
/// exits non-zero whenever it reports diagnostics, and that is a normal result.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Luau analyzer command `{command}` not found: {source}")]
    NotFound {
        command: String,
        #[source]
        source: which::Error,
    },
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` did not finish within {secs}s")]
    TimedOut { command: String, secs: u64 },
}

/// Failure of an on-demand introspection command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Cannot show file! Uses Luau Analyze Rojo is not enabled in configurations!")]
    RojoDisabled,
    #[error(transparent)]
    Launch(#[from] LaunchError),
}
