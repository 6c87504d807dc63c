//! Most-recently-opened files, persisted through a [`StorageBackend`]

use super::{StorageBackend, StorageResult, load_json_backend, save_json_backend};
use std::path::{Path, PathBuf};

/// Entries kept in the list
pub const MAX_RECENT_FILES: usize = 10;

const STORAGE_KEY: &str = "recent_files";

/// Recently opened files, most recent first, without duplicates
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecentFiles {
    paths: Vec<PathBuf>,
}

impl RecentFiles {
    /// Read the list from `backend`; a missing key yields an empty list
    pub fn load(backend: &dyn StorageBackend) -> StorageResult<Self> {
        let paths: Vec<PathBuf> = load_json_backend(backend, STORAGE_KEY)?.unwrap_or_default();
        let mut recent = Self::default();
        // Stored most recent first
        for path in paths.into_iter().rev() {
            recent.push(path);
        }
        Ok(recent)
    }

    pub fn save(&self, backend: &dyn StorageBackend) -> StorageResult<()> {
        save_json_backend(backend, STORAGE_KEY, &self.paths)
    }

    /// Move `path` to the front, dropping the oldest entry when full
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.paths.retain(|p| p != &path);
        self.paths.insert(0, path);
        self.paths.truncate(MAX_RECENT_FILES);
    }

    /// Drop `path` from the list, returning whether it was present
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
