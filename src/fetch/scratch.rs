//! Scratch directories for downloads and unpacking

use crate::error::{FreezerError, FreezerResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Furnishes scratch directories owned by a single fetch
pub trait TempProvider: Send + Sync {
    /// Create a fresh, empty directory
    fn scratch_dir(&self, prefix: &str) -> FreezerResult<ScratchDir>;
}

/// A scratch directory that is removed when reclaimed or dropped, unless kept
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now
    ///
    /// Content already moved elsewhere (e.g. published) is not an error.
    pub fn reclaim(self) -> FreezerResult<()> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FreezerError::io(
                format!("removing scratch directory {}", path.display()),
                e,
            )),
        }
    }

    /// Leave the directory on disk and return its path
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

/// Creates scratch directories inside a fixed parent
///
/// Placing the parent inside the cache root keeps scratch data on the same
/// filesystem as published entries, so publishing can be a rename.
#[derive(Debug, Clone)]
pub struct StagingArea {
    parent: PathBuf,
}

impl StagingArea {
    pub fn new(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: parent.into(),
        }
    }

    fn create_in_parent(&self, prefix: &str) -> std::io::Result<TempDir> {
        std::fs::create_dir_all(&self.parent)?;
        tempfile::Builder::new().prefix(prefix).tempdir_in(&self.parent)
    }
}

impl TempProvider for StagingArea {
    fn scratch_dir(&self, prefix: &str) -> FreezerResult<ScratchDir> {
        // `cache clear` in another process may remove the parent in between
        let dir = match self.create_in_parent(prefix) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.create_in_parent(prefix),
            other => other,
        }
        .map_err(|e| {
            FreezerError::io(
                format!("creating scratch directory in {}", self.parent.display()),
                e,
            )
        })?;
        Ok(ScratchDir { dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parent_is_recreated() {
        let temp = TempDir::new().unwrap();
        let parent = temp.path().join(".staging");
        let area = StagingArea::new(&parent);

        area.scratch_dir("fetch-").unwrap().reclaim().unwrap();
        std::fs::remove_dir(&parent).unwrap();

        let scratch = area.scratch_dir("fetch-").unwrap();
        assert!(scratch.path().starts_with(&parent));
    }

    #[test]
    fn scratch_dirs_are_unique_and_prefixed() {
        let temp = TempDir::new().unwrap();
        let area = StagingArea::new(temp.path().join(".staging"));

        let a = area.scratch_dir("fetch-").unwrap();
        let b = area.scratch_dir("fetch-").unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(temp.path().join(".staging")));
        let name = a.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("fetch-"));
    }

    #[test]
    fn reclaim_removes_directory() {
        let temp = TempDir::new().unwrap();
        let scratch = StagingArea::new(temp.path()).scratch_dir("x-").unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::write(path.join("file"), "data").unwrap();

        scratch.reclaim().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn reclaim_tolerates_moved_directory() {
        let temp = TempDir::new().unwrap();
        let scratch = StagingArea::new(temp.path().join("s")).scratch_dir("x-").unwrap();
        std::fs::rename(scratch.path(), temp.path().join("moved")).unwrap();

        scratch.reclaim().unwrap();
    }

    #[test]
    fn keep_leaves_directory() {
        let temp = TempDir::new().unwrap();
        let scratch = StagingArea::new(temp.path()).scratch_dir("x-").unwrap();
        let path = scratch.keep();
        assert!(path.is_dir());
    }
}
