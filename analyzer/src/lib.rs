//! Runs `luau-analyze` per file and publishes its diagnostics.

pub mod host;
pub mod process;
pub mod resolver;

pub(crate) mod args;
pub(crate) mod parse;

mod diagnostics;
mod error;
mod orchestrator;
mod registry;
mod session;

#[cfg(test)]
mod testing;

pub use args::{ANNOTATE_FLAG, DUMP_SOURCE_MAP_FLAG};
pub use diagnostics::{DiagnosticCollection, DiagnosticsSnapshot};
pub use error::{CommandError, LaunchError};
pub use host::{
    ConfigSource, Host, Notifier, PickItem, Picker, StateStore, TypeInstaller, Workspace,
};
pub use orchestrator::{AnalysisEvent, Orchestrator};
pub use parse::parse_output;
pub use process::{LaunchFut, ProcessLauncher, ProcessOutput, TokioLauncher};
pub use registry::SessionRegistry;
pub use resolver::ResolvedPath;
pub use session::{AnalyzerSession, RunOutcome, RunRequest, RunToken};
