//! Factory for the collaborators a fetch needs
//!
//! The stock command asks a [`FetchFactory`] for its cache session, release
//! source and fetch tools, so tests can swap in deterministic fakes.

use crate::cache::{CacheSession, DiskCache};
use crate::config::StockConfig;
use crate::error::FreezerResult;
use crate::fetch::packager::{PackagingTool, TarballPackager};
use crate::fetch::scratch::{StagingArea, TempProvider};
use crate::fetch::transport::{ArtifactTransport, HttpTransport};
use crate::release::{GithubReleaseService, ReleaseSource};
use async_trait::async_trait;
use std::path::Path;

/// Builds the collaborators for one stock invocation
#[async_trait]
pub trait FetchFactory: Send + Sync {
    /// Open the cache rooted at `root`
    async fn open_cache(&self, root: &Path) -> FreezerResult<Box<dyn CacheSession>>;

    /// Release source for the configured endpoint and credential
    fn release_source(&self, config: &StockConfig) -> Box<dyn ReleaseSource>;

    /// Transport for downloading assets
    fn transport(&self, config: &StockConfig) -> Box<dyn ArtifactTransport>;

    /// Tool that verifies and unpacks archives
    fn packager(&self) -> Box<dyn PackagingTool>;

    /// Scratch directory provider for a cache rooted at `root`
    fn temp_provider(&self, root: &Path) -> Box<dyn TempProvider>;
}

/// Production collaborators: disk cache, GitHub API, HTTP, tarballs
#[derive(Debug, Clone, Copy, Default)]
pub struct GithubFactory;

#[async_trait]
impl FetchFactory for GithubFactory {
    async fn open_cache(&self, root: &Path) -> FreezerResult<Box<dyn CacheSession>> {
        Ok(Box::new(DiskCache::open(root).await?))
    }

    fn release_source(&self, config: &StockConfig) -> Box<dyn ReleaseSource> {
        Box::new(GithubReleaseService::new(
            config.endpoint().clone(),
            config.token().clone(),
        ))
    }

    fn transport(&self, config: &StockConfig) -> Box<dyn ArtifactTransport> {
        Box::new(HttpTransport::new(Some(config.token().clone())))
    }

    fn packager(&self) -> Box<dyn PackagingTool> {
        Box::new(TarballPackager)
    }

    fn temp_provider(&self, root: &Path) -> Box<dyn TempProvider> {
        Box::new(StagingArea::new(root.join(crate::cache::STAGING_DIR)))
    }
}
