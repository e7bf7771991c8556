//! Registry of live analyzer sessions, one per tracked file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::session::AnalyzerSession;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<PathBuf, AnalyzerSession>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `path`, creating it if the file is not tracked yet.
    pub fn ensure(&mut self, path: &Path) -> &mut AnalyzerSession {
        self.sessions.entry(path.to_path_buf()).or_insert_with(|| {
            tracing::debug!(path = %path.display(), "Tracking file");
            AnalyzerSession::new(path.to_path_buf())
        })
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&AnalyzerSession> {
        self.sessions.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut AnalyzerSession> {
        self.sessions.get_mut(path)
    }

    pub fn remove(&mut self, path: &Path) -> Option<AnalyzerSession> {
        let removed = self.sessions.remove(path);
        if removed.is_some() {
            tracing::debug!(path = %path.display(), "Disposed session");
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.sessions.contains_key(path)
    }

    /// Tracked paths in sorted order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.sessions.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut AnalyzerSession)) {
        for session in self.sessions.values_mut() {
            f(session);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_creates_once() {
        let mut registry = SessionRegistry::new();
        let path = Path::new("/w/a.luau");
        registry.ensure(path).begin_run(crate::session::RunToken::new(7));
        // Second ensure returns the same session, not a fresh one.
        assert!(
            registry
                .ensure(path)
                .is_latest(crate::session::RunToken::new(7))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_disposes() {
        let mut registry = SessionRegistry::new();
        let path = Path::new("/w/a.luau");
        registry.ensure(path);
        assert!(registry.remove(path).is_some());
        assert!(!registry.contains(path));
        assert!(registry.remove(path).is_none());
    }

    #[test]
    fn test_paths_sorted() {
        let mut registry = SessionRegistry::new();
        registry.ensure(Path::new("/w/b.luau"));
        registry.ensure(Path::new("/w/a.luau"));
        assert_eq!(
            registry.paths(),
            vec![PathBuf::from("/w/a.luau"), PathBuf::from("/w/b.luau")]
        );
    }

    #[test]
    fn test_for_each_mut_visits_all() {
        let mut registry = SessionRegistry::new();
        registry.ensure(Path::new("/w/a.luau"));
        registry.ensure(Path::new("/w/b.luau"));
        let mut seen = 0;
        registry.for_each_mut(|_| seen += 1);
        assert_eq!(seen, 2);
        registry.clear();
        assert!(registry.is_empty());
    }
}
