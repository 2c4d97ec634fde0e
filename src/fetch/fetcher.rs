//! Fetch-with-cache orchestration
//!
//! ```text
//! Idle -> CacheLookup -> Hit ------------------------------------> Done
//!                     \-> Miss -> Querying -> Downloading -> Unpacking -> Publishing -> Done
//! ```
//!
//! Any failure after the lookup ends the fetch with that error; nothing is
//! retried and no partial result is returned.

use crate::buildpack::RemoteBuildpack;
use crate::cache::{ArtifactProvenance, CacheSession};
use crate::error::{FreezerError, FreezerResult};
use crate::fetch::packager::PackagingTool;
use crate::fetch::scratch::{ScratchDir, TempProvider};
use crate::fetch::transport::ArtifactTransport;
use crate::release::{ReleaseAsset, ReleaseSource};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Prefix of scratch directories created for a fetch
const SCRATCH_PREFIX: &str = "fetch-";

/// Step a fetch is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    CacheLookup,
    Querying,
    Downloading,
    Unpacking,
    Publishing,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheLookup => write!(f, "cache lookup"),
            Self::Querying => write!(f, "release query"),
            Self::Downloading => write!(f, "download"),
            Self::Unpacking => write!(f, "unpack"),
            Self::Publishing => write!(f, "publish"),
        }
    }
}

/// Resolves a buildpack to a local directory, fetching it on a cache miss
pub struct RemoteFetcher<'a> {
    cache: &'a dyn CacheSession,
    releases: &'a dyn ReleaseSource,
    transport: &'a dyn ArtifactTransport,
    packager: &'a dyn PackagingTool,
    scratch: &'a dyn TempProvider,
}

impl<'a> RemoteFetcher<'a> {
    pub fn new(
        cache: &'a dyn CacheSession,
        releases: &'a dyn ReleaseSource,
        transport: &'a dyn ArtifactTransport,
        packager: &'a dyn PackagingTool,
        scratch: &'a dyn TempProvider,
    ) -> Self {
        Self {
            cache,
            releases,
            transport,
            packager,
            scratch,
        }
    }

    /// Return the cached path for `buildpack`, fetching and publishing it first
    /// if the cache has no entry
    pub async fn get(&self, buildpack: &RemoteBuildpack) -> FreezerResult<PathBuf> {
        debug!("{}: {}", buildpack, FetchStage::CacheLookup);
        if let Some(entry) = self.cache.lookup(buildpack).await? {
            info!(
                "Cache hit for {} ({}) at {}",
                buildpack,
                entry.version,
                entry.uri.display()
            );
            return Ok(entry.uri);
        }

        info!("Cache miss for {}, fetching latest release", buildpack);
        debug!("{}: {}", buildpack, FetchStage::Querying);
        let release = self.releases.query(buildpack).await?;

        let asset = release
            .select_asset(buildpack)
            .ok_or_else(|| FreezerError::NoMatchingAsset {
                identity: buildpack.to_string(),
                version: release.version.clone(),
                found: release.asset_names(),
            })?;
        debug!("Selected asset {} from {}", asset.name, release.tag);

        let scratch = self.scratch.scratch_dir(SCRATCH_PREFIX)?;
        let outcome = self
            .fetch_into(&scratch, buildpack, &release.version, asset)
            .await;
        match outcome {
            Ok(path) => {
                if let Err(e) = scratch.reclaim() {
                    warn!("Failed to remove scratch directory: {}", e);
                }
                Ok(path)
            }
            Err((stage, e)) => {
                let kept = scratch.keep();
                warn!(
                    "{} failed during {}; scratch data left at {}",
                    buildpack,
                    stage,
                    kept.display()
                );
                Err(e)
            }
        }
    }

    async fn fetch_into(
        &self,
        scratch: &ScratchDir,
        buildpack: &RemoteBuildpack,
        version: &str,
        asset: &ReleaseAsset,
    ) -> Result<PathBuf, (FetchStage, FreezerError)> {
        let download_dir = scratch.path().join("download");
        let unpack_dir = scratch.path().join("unpacked");
        for dir in [&download_dir, &unpack_dir] {
            std::fs::create_dir(dir).map_err(|e| {
                (
                    FetchStage::Downloading,
                    FreezerError::io(format!("creating {}", dir.display()), e),
                )
            })?;
        }

        debug!("{}: {}", buildpack, FetchStage::Downloading);
        let archive = self
            .transport
            .download(asset, &download_dir)
            .await
            .map_err(|e| (FetchStage::Downloading, e))?;

        debug!("{}: {}", buildpack, FetchStage::Unpacking);
        let expected = asset.expected_sha256();
        let unpacked = self
            .packager
            .unpack(&archive, expected.as_deref(), &unpack_dir)
            .await
            .map_err(|e| (FetchStage::Unpacking, e))?;

        debug!("{}: {}", buildpack, FetchStage::Publishing);
        let provenance = ArtifactProvenance {
            asset: asset.name.clone(),
            sha256: unpacked.sha256,
        };
        self.cache
            .publish(buildpack, version, &unpacked.dir, &provenance)
            .await
            .map_err(|e| (FetchStage::Publishing, e))
    }
}
