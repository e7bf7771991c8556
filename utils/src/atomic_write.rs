//! Atomic file write helpers.
//!
//! Config and workspace-state files are rewritten through a temp file in the
//! same directory followed by a rename, so a crash mid-write leaves either the
//! old or the new contents on disk. On Windows, rename-over-existing fails, so
//! the existing file is moved aside to `.bak` and restored on failure.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// `sync_all` the temp file before the rename.
    #[default]
    SyncAll,
    SkipSync,
}

/// Write `bytes` to `path` atomically, creating missing parent directories.
pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    atomic_write_with_policy(path, bytes, SyncPolicy::default())
}

pub fn atomic_write_with_policy(
    path: impl AsRef<Path>,
    bytes: &[u8],
    sync: SyncPolicy,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if sync == SyncPolicy::SyncAll {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup = path.with_extension("bak");
        let _ = fs::remove_file(&backup);
        fs::rename(path, &backup)?;

        if let Err(rename_err) = err.file.persist(path) {
            let _ = fs::rename(&backup, path);
            return Err(rename_err.error);
        }
        if let Err(e) = fs::remove_file(&backup) {
            tracing::warn!(path = %backup.display(), "Failed to remove .bak after atomic write: {e}");
        }
    }

    debug!(path = %path.display(), bytes = bytes.len(), "Atomic write complete");
    Ok(())
}

/// Restore `path` from `path.bak` if a previous write was interrupted between
/// moving the old file aside and persisting the new one.
pub fn recover_bak_file(path: &Path) {
    let backup = path.with_extension("bak");
    if path.exists() || !backup.exists() {
        return;
    }
    match fs::rename(&backup, path) {
        Ok(()) => tracing::warn!(path = %path.display(), "Recovered .bak file from interrupted write"),
        Err(e) => tracing::warn!(path = %path.display(), "Failed to recover .bak file: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{SyncPolicy, atomic_write, atomic_write_with_policy, recover_bak_file};

    #[test]
    fn atomic_write_overwrites_existing_and_cleans_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        atomic_write_with_policy(&path, b"one", SyncPolicy::SkipSync).expect("write one");
        atomic_write_with_policy(&path, b"two", SyncPolicy::SkipSync).expect("write two");

        assert_eq!(fs::read_to_string(&path).expect("read"), "two");
        assert!(!path.with_extension("bak").exists());
    }

    #[test]
    fn atomic_write_creates_missing_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".luau-watch").join("state.json");

        atomic_write(&path, b"{}").expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "{}");
    }

    #[test]
    fn recover_bak_file_restores_missing_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(path.with_extension("bak"), "saved").expect("write bak");

        recover_bak_file(&path);

        assert_eq!(fs::read_to_string(&path).expect("read"), "saved");
        assert!(!path.with_extension("bak").exists());
    }

    #[test]
    fn recover_bak_file_leaves_existing_target_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "current").expect("write");
        fs::write(path.with_extension("bak"), "stale").expect("write bak");

        recover_bak_file(&path);

        assert_eq!(fs::read_to_string(&path).expect("read"), "current");
    }
}
