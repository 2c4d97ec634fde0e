//! Cache session over the on-disk buildpack cache
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   buildpacks-cache.db       index: { "<org>:<repo>": CacheEntry }
//!   .staging/                 scratch space, never read as an entry
//!   <org>/<repo>/<version>/   published, unpacked buildpacks
//! ```
//!
//! Publishing renames a fully unpacked directory out of `.staging/` into its
//! version directory and only then rewrites the index under the index lock.
//! Both steps end in a single rename on one filesystem, so concurrent
//! processes sharing the root never observe a half-written entry.

use crate::buildpack::{validate_segment, RemoteBuildpack};
use crate::cache::index::{
    ArtifactProvenance, CacheEntry, CacheIndex, INDEX_FILE, INDEX_LOCK_FILE,
};
use crate::error::{FreezerError, FreezerResult};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Directory under the cache root used for scratch work
pub const STAGING_DIR: &str = ".staging";

/// Scoped handle to a buildpack cache
///
/// Implementations are opened once per command and must be closed exactly
/// once, whichever way the command exits.
#[async_trait]
pub trait CacheSession: Send + Sync {
    /// Find the published entry for a buildpack without touching the network
    async fn lookup(&self, buildpack: &RemoteBuildpack) -> FreezerResult<Option<CacheEntry>>;

    /// Make the unpacked artifact at `source` visible under `(buildpack, version)`
    ///
    /// Returns the published path. `source` is moved, not copied, when the
    /// version is not yet present.
    async fn publish(
        &self,
        buildpack: &RemoteBuildpack,
        version: &str,
        source: &Path,
        provenance: &ArtifactProvenance,
    ) -> FreezerResult<PathBuf>;

    /// Release the session
    ///
    /// Synchronous so that [`SessionGuard`] can run it on drop.
    fn close(&mut self) -> FreezerResult<()>;
}

/// Owns an open session and closes it exactly once
///
/// Call [`SessionGuard::close`] to observe the close result. If the guard is
/// dropped first (early return, panic, cancelled future) the session is
/// closed on drop and any error is logged.
pub struct SessionGuard {
    session: Box<dyn CacheSession>,
    closed: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn CacheSession>) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    pub fn session(&self) -> &dyn CacheSession {
        self.session.as_ref()
    }

    /// Close the session; later calls are no-ops
    pub fn close(&mut self) -> FreezerResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.session.close()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close cache session: {}", e);
        }
    }
}

/// Cache rooted in a local directory
#[derive(Debug)]
pub struct DiskCache {
    root: PathBuf,
    closed: bool,
}

impl DiskCache {
    /// Prepare the cache root, creating it if absent
    pub async fn open(root: impl Into<PathBuf>) -> FreezerResult<Self> {
        let root = root.into();
        let staging = root.join(STAGING_DIR);

        fs::create_dir_all(&staging)
            .await
            .map_err(|e| FreezerError::CacheOpen {
                path: root.clone(),
                source: e,
            })?;

        // Fail at open rather than mid-fetch if the index is unreadable
        CacheIndex::load(&root.join(INDEX_FILE))?;

        debug!("Opened cache at {}", root.display());
        Ok(Self {
            root,
            closed: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scratch directory on the same filesystem as published entries
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn index_lock_path(&self) -> PathBuf {
        self.root.join(INDEX_LOCK_FILE)
    }

    /// Directory a given version of a buildpack is published to
    pub fn version_dir(&self, buildpack: &RemoteBuildpack, version: &str) -> PathBuf {
        self.root.join(buildpack.cache_subdir()).join(version)
    }

    /// Current index contents
    pub fn entries(&self) -> FreezerResult<CacheIndex> {
        CacheIndex::load(&self.index_path())
    }

    fn ensure_open(&self) -> FreezerResult<()> {
        if self.closed {
            return Err(FreezerError::Internal(
                "cache session used after close".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheSession for DiskCache {
    async fn lookup(&self, buildpack: &RemoteBuildpack) -> FreezerResult<Option<CacheEntry>> {
        self.ensure_open()?;

        let index = self.entries()?;
        let Some(entry) = index.get(&buildpack.cache_key()) else {
            debug!("No cache entry for {}", buildpack);
            return Ok(None);
        };

        if !entry.uri.is_dir() {
            debug!(
                "Cache entry for {} points at missing {}, treating as miss",
                buildpack,
                entry.uri.display()
            );
            return Ok(None);
        }

        Ok(Some(entry.clone()))
    }

    async fn publish(
        &self,
        buildpack: &RemoteBuildpack,
        version: &str,
        source: &Path,
        provenance: &ArtifactProvenance,
    ) -> FreezerResult<PathBuf> {
        self.ensure_open()?;

        let publish_err = |reason: String| FreezerError::Publish {
            identity: buildpack.to_string(),
            version: version.to_string(),
            reason,
        };

        validate_segment("version", version).map_err(|e| publish_err(e.to_string()))?;

        let target = self.version_dir(buildpack, version);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                publish_err(format!("creating {}: {}", parent.display(), e))
            })?;
        }

        if target.is_dir() {
            debug!(
                "{} {} already published at {}, keeping existing copy",
                buildpack,
                version,
                target.display()
            );
        } else {
            match fs::rename(source, &target).await {
                Ok(()) => {}
                // Another process published the same version between our check and rename
                Err(_) if target.is_dir() => {
                    debug!("Lost publish race for {} {}", buildpack, version);
                }
                Err(e) => {
                    return Err(publish_err(format!(
                        "moving {} to {}: {}",
                        source.display(),
                        target.display(),
                        e
                    )))
                }
            }
        }

        let key = buildpack.cache_key();
        let entry = CacheEntry {
            version: version.to_string(),
            uri: target.clone(),
            asset: provenance.asset.clone(),
            sha256: provenance.sha256.clone(),
            fetched_at: Utc::now(),
        };
        let (index_path, lock_path, staging) =
            (self.index_path(), self.index_lock_path(), self.staging_dir());
        tokio::task::spawn_blocking(move || {
            CacheIndex::update(&index_path, &lock_path, &staging, |index| {
                index.insert(key, entry)
            })
        })
        .await
        .map_err(|e| publish_err(format!("index update task failed: {}", e)))?
        .map_err(|e| publish_err(e.to_string()))?;

        info!("Published {} {} to {}", buildpack, version, target.display());
        Ok(target)
    }

    // `.staging` stays: other processes may be creating scratch dirs in it
    fn close(&mut self) -> FreezerResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("Closed cache at {}", self.root.display());
        Ok(())
    }
}
