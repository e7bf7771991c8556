//! Per-file analyzer session.
//!
//! A session owns the argument list for one file and the diagnostics of its
//! last applied run. It never reads settings on its own: arguments are rebuilt
//! explicitly against a settings snapshot, and each run captures everything it
//! needs in a [`RunRequest`] at launch.

use std::path::{Path, PathBuf};

use luau_watch_types::{Diagnostic, Settings};

use crate::args;
use crate::error::LaunchError;
use crate::parse;
use crate::process::ProcessLauncher;

/// Identifies one launched run. Issued in increasing order; the highest token
/// issued for a session is the only one whose result may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunToken(u64);

impl RunToken {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Result of a diagnostic run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The analyzer started and exited, with any status.
    Diagnostics(Vec<Diagnostic>),
    /// The analyzer could not be started or did not finish.
    LaunchFailed(LaunchError),
}

/// A run detached from its session, safe to move onto another task.
#[derive(Debug, Clone)]
pub struct RunRequest {
    path: PathBuf,
    command: String,
    args: Vec<String>,
    token: RunToken,
}

impl RunRequest {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn token(&self) -> RunToken {
        self.token
    }

    pub async fn execute(self, launcher: &dyn ProcessLauncher) -> RunOutcome {
        let mut argv = self.args;
        argv.push(self.path.to_string_lossy().into_owned());

        match launcher.launch(&self.command, argv).await {
            Ok(output) => {
                let base = launcher
                    .working_dir()
                    .map(Path::to_path_buf)
                    .or_else(|| std::env::current_dir().ok());
                let mut diagnostics =
                    parse::parse_output(&output.stdout, &self.path, base.as_deref());
                diagnostics.extend(parse::parse_output(
                    &output.stderr,
                    &self.path,
                    base.as_deref(),
                ));
                tracing::debug!(
                    path = %self.path.display(),
                    status = ?output.status,
                    count = diagnostics.len(),
                    token = self.token.value(),
                    "Analyzer run finished"
                );
                RunOutcome::Diagnostics(diagnostics)
            }
            Err(e) => RunOutcome::LaunchFailed(e),
        }
    }
}

#[derive(Debug)]
pub struct AnalyzerSession {
    path: PathBuf,
    command: String,
    args: Vec<String>,
    /// Settings generation the arguments were built against.
    built_for: Option<u64>,
    latest: Option<RunToken>,
    diagnostics: Vec<Diagnostic>,
    /// A launch failure was shown and no run has succeeded since.
    failure_reported: bool,
}

impl AnalyzerSession {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            command: String::new(),
            args: Vec::new(),
            built_for: None,
            latest: None,
            diagnostics: Vec::new(),
            failure_reported: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Diagnostics from the last applied run.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Recompute the argument list. Identical inputs give identical output.
    pub fn rebuild_arguments(
        &mut self,
        settings: &Settings,
        generation: u64,
        project: Option<&Path>,
        type_defs: Option<&Path>,
    ) {
        self.command = settings.analyzer_command().to_string();
        self.args = args::build_arguments(settings, project, type_defs);
        self.built_for = Some(generation);
        self.failure_reported = false;
    }

    /// Whether the arguments predate settings generation `generation`.
    #[must_use]
    pub fn needs_rebuild(&self, generation: u64) -> bool {
        self.built_for != Some(generation)
    }

    /// Record `token` as the newest run and capture its request.
    pub fn begin_run(&mut self, token: RunToken) -> RunRequest {
        self.latest = Some(token);
        RunRequest {
            path: self.path.clone(),
            command: self.command.clone(),
            args: self.args.clone(),
            token,
        }
    }

    #[must_use]
    pub fn is_latest(&self, token: RunToken) -> bool {
        self.latest == Some(token)
    }

    pub(crate) fn set_diagnostics(&mut self, diagnostics: Vec<Diagnostic>) {
        self.diagnostics = diagnostics;
        self.failure_reported = false;
    }

    /// Record a launch failure. Returns `true` if it starts a new failure
    /// streak and should be shown.
    pub(crate) fn note_launch_failure(&mut self) -> bool {
        !std::mem::replace(&mut self.failure_reported, true)
    }

    /// Run the analyzer once with the current arguments and wait for it.
    pub async fn run(&self, launcher: &dyn ProcessLauncher) -> RunOutcome {
        let request = RunRequest {
            path: self.path.clone(),
            command: self.command.clone(),
            args: self.args.clone(),
            token: self.latest.unwrap_or(RunToken(0)),
        };
        request.execute(launcher).await
    }

    /// Run with additional flags and return the raw output, unparsed.
    ///
    /// Used by the introspection commands. Stderr is appended after stdout
    /// when the analyzer wrote anything there.
    pub async fn run_with_extra_flags(
        &self,
        launcher: &dyn ProcessLauncher,
        flags: &[&str],
    ) -> Result<String, LaunchError> {
        let mut argv = self.args.clone();
        argv.extend(flags.iter().map(ToString::to_string));
        argv.push(self.path.to_string_lossy().into_owned());

        let output = launcher.launch(&self.command, argv).await?;
        let mut text = output.stdout;
        if !output.stderr.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&output.stderr);
        }
        Ok(text)
    }
}
