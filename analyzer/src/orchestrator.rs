//! The single owner of analyzer state.
//!
//! Document and configuration events come in through the `on_*` methods.
//! Each analyzer run is spawned onto the tokio runtime and reports back over
//! an event channel; completions are applied here, on the caller's control
//! flow, via [`Orchestrator::poll_events`] or [`Orchestrator::next_event`].
//!
//! Per file, a session moves `untracked → tracked → disposed`. Every launch
//! takes a fresh [`RunToken`]; a completion is applied only if its token is
//! still the newest one issued to a live session, so stale or orphaned
//! results are dropped instead of overwriting newer diagnostics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use luau_watch_types::{DEFAULT_ANALYZER_COMMAND, Diagnostic, Settings, is_source_file};
use tokio::sync::mpsc;

use crate::args::{ANNOTATE_FLAG, DUMP_SOURCE_MAP_FLAG};
use crate::diagnostics::{DiagnosticCollection, DiagnosticsSnapshot};
use crate::error::CommandError;
use crate::host::Host;
use crate::process::ProcessLauncher;
use crate::registry::SessionRegistry;
use crate::resolver;
use crate::session::{AnalyzerSession, RunOutcome, RunToken};

/// Channel capacity for completions flowing back from run tasks.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Rojo paths resolved for one settings generation. `None` entries are
/// remembered too, so a dismissed prompt is not repeated for every file.
#[derive(Debug, Clone)]
struct AuxiliaryPaths {
    generation: u64,
    project: Option<PathBuf>,
    type_defs: Option<PathBuf>,
}

/// A run task finished.
#[derive(Debug)]
pub struct AnalysisEvent {
    pub path: PathBuf,
    pub token: RunToken,
    pub outcome: RunOutcome,
}

pub struct Orchestrator<H: Host> {
    host: H,
    launcher: Arc<dyn ProcessLauncher>,
    settings: Arc<Settings>,
    /// Bumped whenever sessions must rebuild their arguments.
    generation: u64,
    registry: SessionRegistry,
    collection: DiagnosticCollection,
    active: Option<PathBuf>,
    last_token: u64,
    in_flight: usize,
    auxiliary: Option<AuxiliaryPaths>,
    event_tx: mpsc::Sender<AnalysisEvent>,
    event_rx: mpsc::Receiver<AnalysisEvent>,
}

impl<H: Host> Orchestrator<H> {
    /// Create an orchestrator with default settings and nothing tracked.
    ///
    /// Call [`Orchestrator::activate`] to load configuration.
    pub fn new(host: H, launcher: Arc<dyn ProcessLauncher>) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            host,
            launcher,
            settings: Arc::new(Settings::default()),
            generation: 0,
            registry: SessionRegistry::new(),
            collection: DiagnosticCollection::new(),
            active: None,
            last_token: 0,
            in_flight: 0,
            auxiliary: None,
            event_tx,
            event_rx,
        }
    }

    /// Load configuration, then analyze the active document if there is one.
    pub fn activate(&mut self, active: Option<&Path>) {
        self.on_configuration_changed();
        if active.is_some() {
            self.on_active_document_changed(active);
        }
        tracing::info!("Luau analyzer activated");
    }

    pub fn on_document_opened(&mut self, path: &Path) {
        self.update_diagnostics(path);
    }

    pub fn on_document_changed(&mut self, path: &Path) {
        self.update_diagnostics(path);
    }

    pub fn on_active_document_changed(&mut self, path: Option<&Path>) {
        self.active = path.map(Path::to_path_buf);
        if let Some(path) = path {
            self.update_diagnostics(path);
        }
    }

    /// Dispose the file's session and withdraw its diagnostics.
    pub fn on_document_closed(&mut self, path: &Path) {
        self.collection.remove(path);
        self.registry.remove(path);
    }

    /// Reload settings and re-validate every tracked file.
    ///
    /// If the configuration cannot be read, the error is shown and the
    /// previous settings stay in force.
    pub fn on_configuration_changed(&mut self) {
        let raw = match self.host.load_settings() {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to load configuration: {e:#}");
                self.host
                    .show_error(&format!("Failed to load configuration: {e:#}"));
                return;
            }
        };

        let resolved = Settings::resolve(raw);
        if resolved.command_repaired {
            self.host.show_error(&format!(
                "Luau Analyzer command not found! Setting command to: `{DEFAULT_ANALYZER_COMMAND}`"
            ));
            if let Err(e) = self
                .host
                .persist_analyzer_command(DEFAULT_ANALYZER_COMMAND)
            {
                tracing::warn!("Failed to persist analyzer command: {e:#}");
            }
        }

        tracing::debug!(settings = ?resolved.settings, "Settings updated");
        self.settings = Arc::new(resolved.settings);
        self.update_all_files();
    }

    /// Dump the analyzer's source map for the active file.
    pub async fn show_source_map(&mut self) -> Result<Option<String>, CommandError> {
        self.run_introspection(DUMP_SOURCE_MAP_FLAG, "text").await
    }

    /// Show the active file annotated with inferred types.
    pub async fn show_annotations(&mut self) -> Result<Option<String>, CommandError> {
        self.run_introspection(ANNOTATE_FLAG, "lua").await
    }

    /// Install type definitions through the host, cache the installed file as
    /// the resolved definitions, and re-validate.
    pub fn install_types(&mut self) {
        let roots = self.host.roots();
        match self.host.install_types(&roots) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Installed type definitions");
                if let Err(e) = self
                    .host
                    .set_path(resolver::TYPE_DEFS_CACHE_KEY, Some(&path))
                {
                    tracing::warn!("Failed to cache installed type definitions: {e:#}");
                }
                self.update_all_files();
            }
            Err(e) => {
                self.host
                    .show_error(&format!("Failed to install type definitions: {e:#}"));
            }
        }
    }

    /// Drain completed runs without waiting, up to `budget`.
    pub fn poll_events(&mut self, budget: usize) -> usize {
        let mut count = 0;
        while count < budget {
            match self.event_rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    count += 1;
                }
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        count
    }

    /// Wait for the next completed run and apply it.
    ///
    /// Returns the file whose diagnostics were republished, or `None` if the
    /// result was dropped.
    pub async fn next_event(&mut self) -> Option<PathBuf> {
        let event = self.event_rx.recv().await?;
        self.handle_event(event)
    }

    /// Apply completions until no run is in flight.
    pub async fn wait_idle(&mut self) {
        while self.in_flight > 0 {
            let Some(event) = self.event_rx.recv().await else {
                break;
            };
            self.handle_event(event);
        }
    }

    /// Drop every session and published diagnostic.
    pub fn shutdown(&mut self) {
        self.registry.clear();
        self.collection.clear();
        self.active = None;
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn diagnostics(&self, path: &Path) -> &[Diagnostic] {
        self.collection.get(path)
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.collection.snapshot()
    }

    #[must_use]
    pub fn session(&self, path: &Path) -> Option<&AnalyzerSession> {
        self.registry.get(path)
    }

    #[must_use]
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        self.registry.paths()
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Track `path` if it is a source file and launch a run for it.
    fn update_diagnostics(&mut self, path: &Path) {
        if !is_source_file(path) {
            return;
        }

        let needs_rebuild = self
            .registry
            .get(path)
            .is_none_or(|s| s.needs_rebuild(self.generation));
        if needs_rebuild {
            let (project, type_defs) = self.auxiliary_paths();
            let settings = Arc::clone(&self.settings);
            self.registry.ensure(path).rebuild_arguments(
                &settings,
                self.generation,
                project.as_deref(),
                type_defs.as_deref(),
            );
        }

        self.launch(path);
    }

    /// Rebuild every session against the current settings and re-run it.
    fn update_all_files(&mut self) {
        self.generation += 1;
        if self.registry.is_empty() {
            return;
        }

        let (project, type_defs) = self.auxiliary_paths();
        let settings = Arc::clone(&self.settings);
        let generation = self.generation;
        self.registry.for_each_mut(|session| {
            session.rebuild_arguments(
                &settings,
                generation,
                project.as_deref(),
                type_defs.as_deref(),
            );
        });

        for path in self.registry.paths() {
            self.launch(&path);
        }
    }

    /// Project and type definitions paths for Rojo mode, resolved at most
    /// once per settings generation.
    ///
    /// A resolved (cached or picked) file wins; otherwise the configured path
    /// is used if it exists, absolute or relative to a workspace root.
    fn auxiliary_paths(&mut self) -> (Option<PathBuf>, Option<PathBuf>) {
        if !self.settings.uses_rojo() {
            return (None, None);
        }
        if let Some(aux) = &self.auxiliary
            && aux.generation == self.generation
        {
            return (aux.project.clone(), aux.type_defs.clone());
        }

        let project = resolver::resolve_rojo_project(&mut self.host)
            .map(|r| r.absolute)
            .or_else(|| self.configured_path(self.settings.rojo_project()));
        let type_defs = resolver::resolve_type_definitions(&mut self.host)
            .map(|r| r.absolute)
            .or_else(|| self.configured_path(self.settings.type_definitions()));

        if project.is_none() {
            tracing::info!("No Rojo project file found; running without --project");
        }
        if type_defs.is_none() {
            tracing::info!("No type definitions file found; running without --defs");
        }
        self.auxiliary = Some(AuxiliaryPaths {
            generation: self.generation,
            project: project.clone(),
            type_defs: type_defs.clone(),
        });
        (project, type_defs)
    }

    fn configured_path(&self, configured: &Path) -> Option<PathBuf> {
        if configured.is_absolute() {
            return configured.exists().then(|| configured.to_path_buf());
        }
        self.host
            .roots()
            .into_iter()
            .map(|root| root.join(configured))
            .find(|candidate| candidate.exists())
    }

    fn launch(&mut self, path: &Path) {
        let Some(session) = self.registry.get_mut(path) else {
            return;
        };

        self.last_token += 1;
        let request = session.begin_run(RunToken::new(self.last_token));
        self.in_flight += 1;

        let launcher = Arc::clone(&self.launcher);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let path = request.path().to_path_buf();
            let token = request.token();
            let outcome = request.execute(launcher.as_ref()).await;
            let _ = event_tx
                .send(AnalysisEvent {
                    path,
                    token,
                    outcome,
                })
                .await;
        });
    }

    fn handle_event(&mut self, event: AnalysisEvent) -> Option<PathBuf> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let AnalysisEvent {
            path,
            token,
            outcome,
        } = event;

        let Some(session) = self.registry.get_mut(&path) else {
            tracing::debug!(path = %path.display(), "Dropping result for closed file");
            return None;
        };
        if !session.is_latest(token) {
            tracing::debug!(
                path = %path.display(),
                token = token.value(),
                "Discarding result superseded by a newer run"
            );
            return None;
        }

        match outcome {
            RunOutcome::Diagnostics(items) => {
                session.set_diagnostics(items.clone());
                tracing::debug!(path = %path.display(), count = items.len(), "Diagnostics updated");
                self.collection.replace(path.clone(), items);
                Some(path)
            }
            RunOutcome::LaunchFailed(e) => {
                tracing::warn!(path = %path.display(), "Analyzer launch failed: {e}");
                if session.note_launch_failure() {
                    self.host.show_error(&e.to_string());
                }
                None
            }
        }
    }

    async fn run_introspection(
        &mut self,
        flag: &str,
        language: &str,
    ) -> Result<Option<String>, CommandError> {
        if !self.settings.uses_rojo() {
            let err = CommandError::RojoDisabled;
            self.host.show_error(&err.to_string());
            return Err(err);
        }

        let Some(session) = self.active.as_deref().and_then(|p| self.registry.get(p)) else {
            return Ok(None);
        };

        match session
            .run_with_extra_flags(self.launcher.as_ref(), &[flag])
            .await
        {
            Ok(text) => {
                self.host.show_document(language, &text);
                Ok(Some(text))
            }
            Err(e) => {
                self.host.show_error(&e.to_string());
                Err(e.into())
            }
        }
    }
}
