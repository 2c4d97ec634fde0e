//! Cache index persistence
//!
//! The index is a JSON document mapping `org:repo` keys to the entry most
//! recently published for that buildpack. It is replaced wholesale by
//! writing a temporary file next to it and renaming it into place, so a
//! reader sees either the old index or the new one, never a torn write.
//! Writers serialize on an exclusive lock of a sibling lock file, so
//! concurrent publishes of different buildpacks never drop each other's
//! entries.

use crate::error::{FreezerError, FreezerResult};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the index inside the cache root
pub const INDEX_FILE: &str = "buildpacks-cache.db";

/// Lock file guarding index rewrites
///
/// The index itself is replaced by rename, so the lock lives on a separate
/// file whose inode never changes.
pub const INDEX_LOCK_FILE: &str = "buildpacks-cache.lock";

/// A published buildpack version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Normalized release version
    pub version: String,
    /// Directory holding the unpacked buildpack
    pub uri: PathBuf,
    /// Release asset the entry was built from
    pub asset: String,
    /// SHA-256 of the downloaded archive
    pub sha256: String,
    /// When the entry was published
    pub fetched_at: DateTime<Utc>,
}

/// Where a published artifact came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactProvenance {
    pub asset: String,
    pub sha256: String,
}

/// In-memory view of the index file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheIndex {
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheIndex {
    /// Read the index, treating a missing file as empty
    pub fn load(path: &Path) -> FreezerResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(FreezerError::cache(
                    format!("reading cache index {}", path.display()),
                    e,
                ))
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).map_err(|e| FreezerError::CacheIndexCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Atomically replace the index file, staging the write in `staging_dir`
    ///
    /// `staging_dir` must be on the same filesystem as `path`.
    pub fn save(&self, path: &Path, staging_dir: &Path) -> FreezerResult<()> {
        let content = serde_json::to_vec_pretty(self)?;

        let mut tmp = NamedTempFile::new_in(staging_dir)
            .map_err(|e| FreezerError::cache("creating temporary index file", e))?;
        tmp.write_all(&content)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| FreezerError::cache("writing temporary index file", e))?;
        tmp.persist(path).map_err(|e| {
            FreezerError::cache(format!("replacing cache index {}", path.display()), e.error)
        })?;

        Ok(())
    }

    /// Read, change and rewrite the index while holding the writer lock
    ///
    /// Blocks until the lock is free. Call from a blocking context.
    pub fn update<F>(
        path: &Path,
        lock_path: &Path,
        staging_dir: &Path,
        change: F,
    ) -> FreezerResult<()>
    where
        F: FnOnce(&mut CacheIndex),
    {
        std::fs::create_dir_all(staging_dir).map_err(|e| {
            FreezerError::cache(format!("creating {}", staging_dir.display()), e)
        })?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(lock_path)
            .map_err(|e| FreezerError::cache(format!("opening {}", lock_path.display()), e))?;
        FileExt::lock_exclusive(&lock)
            .map_err(|e| FreezerError::cache(format!("locking {}", lock_path.display()), e))?;

        let mut index = Self::load(path)?;
        change(&mut index);
        index.save(path, staging_dir)
        // dropping `lock` closes the descriptor and releases the lock
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
