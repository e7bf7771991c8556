//! luau-watch: run `luau-analyze` over Luau sources from the terminal.

mod host;
mod watch;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use luau_watch_analyzer::{Orchestrator, TokioLauncher};
use luau_watch_config::TomlConfigStore;
use luau_watch_types::Diagnostic;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::host::TerminalHost;
use crate::watch::FileEvent;

#[derive(Parser, Debug)]
#[command(name = "luau-watch", version, about = "Luau diagnostics from luau-analyze")]
struct Cli {
    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Config file (defaults to $LUAU_WATCH_CONFIG or ~/.luau-watch/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seconds before an analyzer run is abandoned
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze files once and print their diagnostics
    Check {
        /// Files to analyze (defaults to every source file in the workspace)
        files: Vec<PathBuf>,
    },
    /// Re-analyze files as they change
    Watch,
    /// Print the analyzer's source map for a file (Rojo mode)
    SourceMap { file: PathBuf },
    /// Print a file annotated with inferred types (Rojo mode)
    Annotate { file: PathBuf },
    /// Copy a type definitions file into the workspace and re-validate
    InstallTypes { source: PathBuf },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries diagnostics and documents; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolving {}", path.display()))
}

fn print_diagnostics(path: &Path, diagnostics: &[Diagnostic]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for diagnostic in diagnostics {
        writeln!(out, "{}", diagnostic.display_with_path(path))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let root = match &cli.root {
        Some(root) => absolute(root)?,
        None => std::env::current_dir().context("reading current directory")?,
    };
    let config = match &cli.config {
        Some(path) => TomlConfigStore::new(absolute(path)?),
        None => TomlConfigStore::from_default_location()
            .context("cannot determine config path; pass --config")?,
    };

    let mut host = TerminalHost::new(root.clone(), config);
    if let Command::InstallTypes { source } = &cli.command {
        host = host.with_type_source(absolute(source)?);
    }
    let launcher = TokioLauncher::new()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_working_dir(root.clone());
    let mut orch = Orchestrator::new(host, Arc::new(launcher));

    match cli.command {
        Command::Check { files } => check(&mut orch, &root, &files).await,
        Command::Watch => run_watch(&mut orch, &root).await,
        Command::SourceMap { file } => {
            orch.activate(Some(&absolute(&file)?));
            orch.wait_idle().await;
            Ok(exit_code(orch.show_source_map().await.is_ok()))
        }
        Command::Annotate { file } => {
            orch.activate(Some(&absolute(&file)?));
            orch.wait_idle().await;
            Ok(exit_code(orch.show_annotations().await.is_ok()))
        }
        Command::InstallTypes { .. } => {
            orch.activate(None);
            orch.install_types();
            orch.wait_idle().await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn check(
    orch: &mut Orchestrator<TerminalHost>,
    root: &Path,
    files: &[PathBuf],
) -> Result<ExitCode> {
    let files = if files.is_empty() {
        watch::source_files(root)
    } else {
        files.iter().map(|f| absolute(f)).collect::<Result<_>>()?
    };

    orch.activate(None);
    for file in &files {
        orch.on_document_opened(file);
    }
    orch.wait_idle().await;

    let snapshot = orch.snapshot();
    for (path, diagnostics) in snapshot.files() {
        print_diagnostics(path, diagnostics)?;
    }
    tracing::info!(
        files = orch.tracked_files().len(),
        errors = snapshot.error_count(),
        warnings = snapshot.warning_count(),
        "Check complete"
    );
    Ok(exit_code(snapshot.error_count() == 0))
}

async fn run_watch(orch: &mut Orchestrator<TerminalHost>, root: &Path) -> Result<ExitCode> {
    let config_path = orch.host().config_path().to_path_buf();
    let (_watcher, mut events) = watch::watch_workspace(root, &config_path)?;

    orch.activate(None);
    for file in watch::source_files(root) {
        orch.on_document_opened(&file);
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    FileEvent::Opened(path) => orch.on_document_opened(&path),
                    FileEvent::Changed(path) => orch.on_document_changed(&path),
                    FileEvent::Closed(path) => orch.on_document_closed(&path),
                    FileEvent::ConfigChanged => orch.on_configuration_changed(),
                }
            }
            Some(path) = orch.next_event() => {
                let diagnostics = orch.diagnostics(&path);
                if diagnostics.is_empty() {
                    println!("{}: ok", path.display());
                } else {
                    print_diagnostics(&path, diagnostics)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted; shutting down");
                break;
            }
        }
    }

    orch.shutdown();
    Ok(ExitCode::SUCCESS)
}
