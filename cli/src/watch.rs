//! File system events mapped onto document lifecycle events.

use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::WalkBuilder;
use luau_watch_types::is_source_file;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Opened(PathBuf),
    Changed(PathBuf),
    Closed(PathBuf),
    ConfigChanged,
}

fn classify(kind: &EventKind, path: PathBuf, config_path: &Path) -> Option<FileEvent> {
    if path == config_path {
        return match kind {
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                Some(FileEvent::ConfigChanged)
            }
            _ => None,
        };
    }
    if !is_source_file(&path) {
        return None;
    }
    match kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            Some(FileEvent::Opened(path))
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            Some(FileEvent::Closed(path))
        }
        // Backends that cannot tell the two sides of a rename apart.
        EventKind::Modify(ModifyKind::Name(_)) => Some(if path.exists() {
            FileEvent::Opened(path)
        } else {
            FileEvent::Closed(path)
        }),
        EventKind::Modify(_) => Some(FileEvent::Changed(path)),
        _ => None,
    }
}

/// Map one notify event onto lifecycle events.
///
/// A rename that reports both paths closes the old one and opens the new one.
fn classify_event(event: Event, config_path: &Path) -> Vec<FileEvent> {
    if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
        let mut paths = event.paths.into_iter();
        let from = paths.next().and_then(|p| {
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::From)), p, config_path)
        });
        let to = paths.next().and_then(|p| {
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::To)), p, config_path)
        });
        return from.into_iter().chain(to).collect();
    }

    let kind = event.kind;
    event
        .paths
        .into_iter()
        .filter_map(|path| classify(&kind, path, config_path))
        .collect()
}

/// Watch `root` recursively, plus the directory holding the config file.
///
/// The watcher stops when the returned handle is dropped.
pub fn watch_workspace(
    root: &Path,
    config_path: &Path,
) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<FileEvent>)> {
    let (tx, rx) = mpsc::unbounded_channel();

    let config_file = config_path.to_path_buf();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                for file_event in classify_event(event, &config_file) {
                    tracing::debug!(event = ?file_event, "File event");
                    let _ = tx.send(file_event);
                }
            }
            Err(e) => tracing::warn!("Watch error: {e}"),
        },
        Config::default(),
    )?;

    watcher.watch(root, RecursiveMode::Recursive)?;
    if let Some(dir) = config_path.parent().filter(|d| d.is_dir() && !d.starts_with(root)) {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }
    tracing::info!(root = %root.display(), "Started watching");

    Ok((watcher, rx))
}

/// Source files under `root`, respecting .gitignore, sorted.
pub fn source_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| is_source_file(path))
        .collect();
    files.sort();
    files
}
