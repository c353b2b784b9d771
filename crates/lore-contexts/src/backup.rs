//! Pre-mutation snapshots.
//!
//! Every mutating operation leaves behind a pre-image of the file it is
//! about to change. Snapshots are append-only; nothing in this crate ever
//! deletes one.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use lore_core::constants::{BACKUP_DIR_NAME, BACKUP_FILE_PREFIX};
use lore_core::errors::{ContextError, Result};

/// Copies context files into a `backups/` subdirectory before mutation.
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
}

impl BackupManager {
    /// Manager writing beneath `context_dir`.
    #[must_use]
    pub fn new(context_dir: &Path) -> Self {
        Self {
            backup_dir: context_dir.join(BACKUP_DIR_NAME),
        }
    }

    /// Where snapshots land.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy `source` to a timestamped `backup_<name>_<timestamp>` file.
    ///
    /// Returns `None` when `source` does not exist: first-time creation has
    /// nothing to preserve and still counts as success. Any I/O failure is
    /// fatal to the whole mutation, which must not write without its
    /// pre-image (fail-closed).
    pub fn snapshot(&self, name: &str, source: &Path) -> Result<Option<PathBuf>> {
        if !source.exists() {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.backup_dir)
            .map_err(|e| ContextError::io(&self.backup_dir, e))?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let base = format!("{BACKUP_FILE_PREFIX}{name}_{stamp}");
        let mut target = self.backup_dir.join(&base);
        let mut attempt = 1u32;
        while target.exists() {
            target = self.backup_dir.join(format!("{base}_{attempt}"));
            attempt += 1;
        }

        let _ = std::fs::copy(source, &target).map_err(|e| ContextError::io(source, e))?;
        debug!(context = %name, backup = %target.display(), "Snapshot written");
        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn missing_source_is_successful_noop() {
        let tmp = TempDir::new().unwrap();
        let backups = BackupManager::new(tmp.path());

        let result = backups.snapshot("git", &tmp.path().join("git_context.json"));
        assert!(result.unwrap().is_none());
        assert!(!backups.backup_dir().exists());
    }

    #[test]
    fn snapshot_copies_source_verbatim() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("git_context.json");
        fs::write(&source, r#"{"tool_category": "git", "description": "d"}"#).unwrap();

        let backups = BackupManager::new(tmp.path());
        let path = backups.snapshot("git", &source).unwrap().unwrap();

        assert!(path.starts_with(backups.backup_dir()));
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("backup_git_"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            fs::read_to_string(&source).unwrap()
        );
    }

    #[test]
    fn repeated_snapshots_never_collide() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("git_context.json");
        fs::write(&source, "{}").unwrap();

        let backups = BackupManager::new(tmp.path());
        let first = backups.snapshot("git", &source).unwrap().unwrap();
        let second = backups.snapshot("git", &source).unwrap().unwrap();
        let third = backups.snapshot("git", &source).unwrap().unwrap();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(file_names(backups.backup_dir()).len(), 3);
    }

    #[test]
    fn backups_for_different_contexts_share_the_directory() {
        let tmp = TempDir::new().unwrap();
        let git = tmp.path().join("git_context.json");
        let wiki = tmp.path().join("wiki_context.json");
        fs::write(&git, "{}").unwrap();
        fs::write(&wiki, "{}").unwrap();

        let backups = BackupManager::new(tmp.path());
        let _ = backups.snapshot("git", &git).unwrap();
        let _ = backups.snapshot("wiki", &wiki).unwrap();

        let names = file_names(backups.backup_dir());
        assert!(names.iter().any(|n| n.starts_with("backup_git_")));
        assert!(names.iter().any(|n| n.starts_with("backup_wiki_")));
    }

    #[test]
    fn unwritable_backup_location_fails_closed() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("git_context.json");
        fs::write(&source, "{}").unwrap();
        // A plain file where the backups directory should go.
        fs::write(tmp.path().join(BACKUP_DIR_NAME), "in the way").unwrap();

        let backups = BackupManager::new(tmp.path());
        let err = backups.snapshot("git", &source).unwrap_err();
        assert!(matches!(err, ContextError::Io { .. }));
    }
}
