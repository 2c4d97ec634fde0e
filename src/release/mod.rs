//! Release metadata for buildpacks
//!
//! A [`ReleaseSource`] reports the release a buildpack should be fetched
//! from. The GitHub implementation lives in [`github`].

pub mod github;

pub use github::GithubReleaseService;

use crate::buildpack::RemoteBuildpack;
use crate::error::FreezerResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Archive suffixes recognised as buildpack assets
const ARCHIVE_SUFFIXES: &[&str] = &[".tgz", ".tar.gz"];

/// A downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// File name as published
    pub name: String,
    /// Where the bytes can be fetched from
    pub download_url: String,
    /// Size in bytes, as reported by the release source
    pub size: u64,
    /// Content digest in `algorithm:hex` form, when published
    pub digest: Option<String>,
}

impl ReleaseAsset {
    /// Whether the asset looks like a gzipped tarball
    pub fn is_archive(&self) -> bool {
        ARCHIVE_SUFFIXES.iter().any(|s| self.name.ends_with(s))
    }

    /// Expected SHA-256 as lowercase hex, when the digest is a sha256 one
    pub fn expected_sha256(&self) -> Option<String> {
        self.digest
            .as_deref()
            .and_then(|d| d.strip_prefix("sha256:"))
            .map(|hex| hex.to_ascii_lowercase())
    }
}

/// Release the source reports for a buildpack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseMetadata {
    /// Tag exactly as published (e.g. `v1.2.3`)
    pub tag: String,
    /// Normalized version used as the cache key component (e.g. `1.2.3`)
    pub version: String,
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseMetadata {
    /// Build metadata from a raw tag, normalizing the version
    pub fn new(tag: impl Into<String>, assets: Vec<ReleaseAsset>) -> Self {
        let tag = tag.into();
        let version = normalize_version(&tag);
        Self {
            tag,
            version,
            assets,
        }
    }

    /// Pick the asset that holds the buildpack
    ///
    /// Preference order:
    /// 1. `<repo>-<version>` or `<repo>-v<version>` with an archive suffix
    /// 2. the first archive whose name starts with `<repo>`
    pub fn select_asset(&self, buildpack: &RemoteBuildpack) -> Option<&ReleaseAsset> {
        let repo = buildpack.repo();
        let exact: Vec<String> = [
            format!("{}-{}", repo, self.version),
            format!("{}-v{}", repo, self.version),
        ]
        .iter()
        .flat_map(|stem| ARCHIVE_SUFFIXES.iter().map(move |s| format!("{}{}", stem, s)))
        .collect();

        self.assets
            .iter()
            .find(|a| exact.iter().any(|name| *name == a.name))
            .or_else(|| {
                self.assets
                    .iter()
                    .find(|a| a.is_archive() && a.name.starts_with(repo))
            })
    }

    /// Comma-separated asset names, for error messages
    pub fn asset_names(&self) -> String {
        if self.assets.is_empty() {
            return "none".to_string();
        }
        self.assets
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Strip a leading `v` when the remainder is a semantic version
pub fn normalize_version(tag: &str) -> String {
    let trimmed = tag.trim();
    if let Some(rest) = trimmed.strip_prefix('v') {
        if semver::Version::parse(rest).is_ok() {
            return rest.to_string();
        }
    }
    trimmed.to_string()
}

/// Queries release metadata for a buildpack
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch the release that should be cached for `buildpack`
    async fn query(&self, buildpack: &RemoteBuildpack) -> FreezerResult<ReleaseMetadata>;
}
