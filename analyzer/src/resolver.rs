//! Resolution of the Rojo project file and the type definitions file.
//!
//! Candidates are files directly inside a workspace root whose name ends with
//! the wanted extension. The chosen absolute path is cached in workspace state
//! so the user is prompted at most once, until the file disappears.

use std::fs;
use std::path::{Path, PathBuf};

use crate::host::{PickItem, Picker, StateStore, Workspace};

pub const ROJO_PROJECT_EXTENSION: &str = ".project.json";
pub const ROJO_PROJECT_CACHE_KEY: &str = "rojoLastPath";
pub const TYPE_DEFS_EXTENSION: &str = ".d.lua";
pub const TYPE_DEFS_CACHE_KEY: &str = "typeDefsLastPath";

/// A resolved auxiliary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// What the analyzer is given.
    pub absolute: PathBuf,
    /// Workspace-relative form for display.
    pub display: String,
}

fn display_path(roots: &[PathBuf], absolute: &Path) -> String {
    roots
        .iter()
        .find_map(|root| absolute.strip_prefix(root).ok())
        .unwrap_or(absolute)
        .display()
        .to_string()
}

fn candidates(roots: &[PathBuf], extension: &str) -> Vec<PickItem> {
    let mut items = Vec::new();
    for root in roots {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(root = %root.display(), "Cannot list workspace root: {e}");
                continue;
            }
        };

        let mut found: Vec<PickItem> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                let path = entry.path();
                (name.ends_with(extension) && path.is_file()).then(|| PickItem {
                    label: name,
                    description: root.display().to_string(),
                    path,
                })
            })
            .collect();
        found.sort_by(|a, b| a.label.cmp(&b.label));
        items.extend(found);
    }
    items
}

/// Scan the workspace roots for files ending in `extension` and let the user
/// choose one.
///
/// With `no_strict`, a single candidate is returned without prompting.
pub fn pick_file<H>(host: &mut H, title: &str, extension: &str, no_strict: bool) -> Option<PathBuf>
where
    H: Workspace + Picker + ?Sized,
{
    let mut items = candidates(&host.roots(), extension);
    if items.is_empty() {
        tracing::debug!(extension, "No candidate files found");
        return None;
    }
    if items.len() == 1 && no_strict {
        return items.pop().map(|item| item.path);
    }

    let choice = host.pick(title, &items)?;
    items.into_iter().nth(choice).map(|item| item.path)
}

/// Resolve the file for `cache_key`, consulting and maintaining the cache.
pub fn resolve_path<H>(
    host: &mut H,
    title: &str,
    extension: &str,
    cache_key: &str,
) -> Option<ResolvedPath>
where
    H: Workspace + Picker + StateStore + ?Sized,
{
    let roots = host.roots();
    if roots.is_empty() {
        return None;
    }

    if let Some(cached) = host.get_path(cache_key) {
        if cached.exists() {
            return Some(ResolvedPath {
                display: display_path(&roots, &cached),
                absolute: cached,
            });
        }
        tracing::info!(key = cache_key, path = %cached.display(), "Cached path no longer exists");
        if let Err(e) = host.set_path(cache_key, None) {
            tracing::warn!(key = cache_key, "Failed to clear cached path: {e:#}");
        }
    }

    let absolute = pick_file(host, title, extension, true)?;
    if let Err(e) = host.set_path(cache_key, Some(&absolute)) {
        tracing::warn!(key = cache_key, "Failed to cache resolved path: {e:#}");
    }
    tracing::info!(key = cache_key, path = %absolute.display(), "Resolved path");

    Some(ResolvedPath {
        display: display_path(&roots, &absolute),
        absolute,
    })
}

pub fn resolve_rojo_project<H>(host: &mut H) -> Option<ResolvedPath>
where
    H: Workspace + Picker + StateStore + ?Sized,
{
    resolve_path(
        host,
        "Select rojo project",
        ROJO_PROJECT_EXTENSION,
        ROJO_PROJECT_CACHE_KEY,
    )
}

pub fn resolve_type_definitions<H>(host: &mut H) -> Option<ResolvedPath>
where
    H: Workspace + Picker + StateStore + ?Sized,
{
    resolve_path(
        host,
        "Select type definitions",
        TYPE_DEFS_EXTENSION,
        TYPE_DEFS_CACHE_KEY,
    )
}
