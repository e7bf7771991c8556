//! Per-workspace state: resolved file paths that outlive a single run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use luau_watch_analyzer::StateStore;

const STATE_DIR: &str = ".luau-watch";
const STATE_FILE: &str = "state.json";

/// Per-workspace key/value state kept in `<root>/.luau-watch/state.json`.
///
/// An unreadable or corrupt file is treated as empty; the next write
/// replaces it.
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl JsonStateStore {
    /// Open the state file for the workspace rooted at `root`.
    #[must_use]
    pub fn for_workspace(root: &Path) -> Self {
        Self::open(root.join(STATE_DIR).join(STATE_FILE))
    }

    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        luau_watch_utils::recover_bak_file(&path);
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "Ignoring corrupt workspace state: {e}");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to read workspace state: {e}");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(&self.entries)?;
        luau_watch_utils::atomic_write(&self.path, &json)?;
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.entries.get(key).cloned()
    }

    fn set_path(&mut self, key: &str, value: Option<&Path>) -> anyhow::Result<()> {
        let changed = match value {
            Some(path) => {
                self.entries.insert(key.to_string(), path.to_path_buf()).as_deref() != Some(path)
            }
            None => self.entries.remove(key).is_some(),
        };
        if changed {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::for_workspace(dir.path());
        assert!(store.get_path("rojoLastPath").is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_path_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("default.project.json");

        let mut store = JsonStateStore::for_workspace(dir.path());
        store.set_path("rojoLastPath", Some(&project)).unwrap();

        let reopened = JsonStateStore::for_workspace(dir.path());
        assert_eq!(reopened.get_path("rojoLastPath"), Some(project));
        assert_eq!(
            reopened.path(),
            dir.path().join(".luau-watch").join("state.json")
        );
    }

    #[test]
    fn test_clearing_a_key_removes_it_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStateStore::for_workspace(dir.path());
        store
            .set_path("typeDefsLastPath", Some(Path::new("/w/globalTypes.d.lua")))
            .unwrap();
        store.set_path("typeDefsLastPath", None).unwrap();

        let reopened = JsonStateStore::for_workspace(dir.path());
        assert!(reopened.get_path("typeDefsLastPath").is_none());
    }

    #[test]
    fn test_clearing_absent_key_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStateStore::for_workspace(dir.path());
        store.set_path("rojoLastPath", None).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let mut store = JsonStateStore::open(path.clone());
        assert!(store.get_path("rojoLastPath").is_none());

        store
            .set_path("rojoLastPath", Some(Path::new("/w/a.project.json")))
            .unwrap();
        let written: BTreeMap<String, PathBuf> =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
    }
}
